// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use ctfd_common::models::{Challenge, Scoreboard, Solve};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct ChallengeRow<'a> {
    #[tabled(rename = "Id")]
    id: u64,
    #[tabled(rename = "Name")]
    name: &'a str,
    #[tabled(rename = "Category")]
    category: &'a str,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Downloaded")]
    downloaded: &'static str,
}

#[derive(Tabled)]
struct ScoreRow<'a> {
    #[tabled(rename = "Rank")]
    rank: u32,
    #[tabled(rename = "Team")]
    name: &'a str,
    #[tabled(rename = "Score")]
    score: i64,
}

#[derive(Tabled)]
struct SolveRow<'a> {
    #[tabled(rename = "Name")]
    name: &'a str,
    #[tabled(rename = "Date")]
    date: &'a str,
}

fn render<T: Tabled>(rows: Vec<T>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

pub(crate) fn challenges<'a, I>(challenges: I) -> String
where
    I: IntoIterator<Item = &'a Challenge>,
{
    let rows = challenges
        .into_iter()
        .map(|challenge| ChallengeRow {
            id: challenge.id,
            name: &challenge.name,
            category: &challenge.category,
            kind: challenge.kind.to_string(),
            downloaded: if challenge.is_downloaded { "yes" } else { "no" },
        })
        .collect();
    render(rows)
}

pub(crate) fn scoreboard(scoreboard: &Scoreboard) -> String {
    let rows = scoreboard
        .iter()
        .map(|(rank, entry)| ScoreRow {
            rank: *rank,
            name: &entry.name,
            score: entry.total_score(),
        })
        .collect();
    render(rows)
}

pub(crate) fn solves(solves: &[Solve]) -> String {
    let rows = solves
        .iter()
        .map(|solve| SolveRow {
            name: &solve.name,
            date: &solve.date,
        })
        .collect();
    render(rows)
}
