//! Console output: popularity ranking and the head of the track table.

use std::io::{self, Write};

use crate::track::TrackRecord;

pub const RANKING_SIZE: usize = 3;

/// Indices of the most and least popular records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extremes {
    pub most_popular: usize,
    pub least_popular: usize,
}

/// The `n` least popular records in ascending popularity, paired with their
/// index in `records`. Sorts a copy; equal popularity keeps collection order.
pub fn top_by_popularity(records: &[TrackRecord], n: usize) -> Vec<(usize, &TrackRecord)> {
    let mut ranked: Vec<(usize, &TrackRecord)> = records.iter().enumerate().collect();
    ranked.sort_by_key(|(_, r)| r.popularity);
    ranked.truncate(n);
    ranked
}

/// First record with the highest and first with the lowest popularity.
pub fn popularity_extremes(records: &[TrackRecord]) -> Option<Extremes> {
    let first = records.first()?;
    let mut extremes = Extremes {
        most_popular: 0,
        least_popular: 0,
    };
    let (mut max, mut min) = (first.popularity, first.popularity);

    for (i, record) in records.iter().enumerate().skip(1) {
        // strict comparisons keep the first occurrence on ties
        if record.popularity > max {
            max = record.popularity;
            extremes.most_popular = i;
        }
        if record.popularity < min {
            min = record.popularity;
            extremes.least_popular = i;
        }
    }

    Some(extremes)
}

fn name_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names.map(|n| n.chars().count()).max().unwrap_or(0).max(4)
}

/// Print the three least popular tracks, or a notice when there are none.
pub fn print_ranking<W: Write>(out: &mut W, records: &[TrackRecord]) -> io::Result<()> {
    if records.is_empty() {
        return writeln!(out, "No tracks found for the artist.");
    }

    let ranked = top_by_popularity(records, RANKING_SIZE);
    let width = name_width(ranked.iter().map(|(_, r)| r.name.as_str()));

    writeln!(out, "Top {} tracks sorted by increasing popularity:", RANKING_SIZE)?;
    writeln!(out, "{:>4}  {:<width$}  {:>10}", "", "name", "popularity", width = width)?;
    for (index, record) in ranked {
        writeln!(
            out,
            "{:>4}  {:<width$}  {:>10}",
            index,
            record.name,
            record.popularity,
            width = width
        )?;
    }
    Ok(())
}

/// Print the first `rows` records with every column.
pub fn print_head<W: Write>(out: &mut W, records: &[TrackRecord], rows: usize) -> io::Result<()> {
    writeln!(out, "Track table head:")?;
    if records.is_empty() {
        return writeln!(out, "  (empty table)");
    }

    let head = &records[..rows.min(records.len())];
    let width = name_width(head.iter().map(|r| r.name.as_str()));

    writeln!(
        out,
        "{:>4}  {:<width$}  {:>10}  {:>11}  {:>7}  {:>6}  {:>16}",
        "", "name", "popularity", "duration_ms", "valence", "energy", "duration_seconds",
        width = width
    )?;
    for (index, r) in head.iter().enumerate() {
        writeln!(
            out,
            "{:>4}  {:<width$}  {:>10}  {:>11}  {:>7.3}  {:>6.3}  {:>16.3}",
            index,
            r.name,
            r.popularity,
            r.duration_ms,
            r.valence,
            r.energy,
            r.duration_seconds,
            width = width
        )?;
    }
    Ok(())
}
