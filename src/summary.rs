//! Plain-text summary of a decoded guide.

use std::fmt;

use crate::epg::{Broadcast, Guide, SeriesInfo, Timestamp};

const UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

/// Format a byte count with SI units, e.g. `1500 -> "1.5 kB"`.
///
/// Counts below ten print exactly. Larger counts are scaled to the largest
/// unit that fits and rounded to one decimal, which is only shown while the
/// scaled value is below ten.
pub fn humanize_bytes(size: u64) -> String {
    if size < 10 {
        return format!("{size} B");
    }

    let mut exponent = 0;
    let mut scale = 1u64;
    while exponent + 1 < UNITS.len() && size / scale >= 1000 {
        scale *= 1000;
        exponent += 1;
    }

    let value = (size as f64 / scale as f64 * 10.0 + 0.5).floor() / 10.0;
    if value < 10.0 {
        format!("{value:.1} {}", UNITS[exponent])
    } else {
        format!("{value:.0} {}", UNITS[exponent])
    }
}

/// Renders a guide together with the metadata of the upload it came from.
pub struct Summary<'a> {
    pub name: &'a str,
    pub size: u64,
    pub guide: &'a Guide,
}

impl<'a> Summary<'a> {
    pub fn new(name: &'a str, size: u64, guide: &'a Guide) -> Self {
        Summary { name, size, guide }
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File: {}", self.name)?;
        writeln!(f, "Size: {}", humanize_bytes(self.size))?;
        writeln!(f, "Broadcasts: {}", self.guide.len())?;

        for broadcast in self.guide {
            writeln!(f)?;
            write_broadcast(f, broadcast)?;
        }

        Ok(())
    }
}

fn write_broadcast(f: &mut fmt::Formatter<'_>, broadcast: &Broadcast) -> fmt::Result {
    writeln!(
        f,
        "{} -> {}  [{}]  {}",
        time_or_unknown(broadcast.start),
        time_or_unknown(broadcast.stop),
        broadcast.channel,
        broadcast.title_str().unwrap_or("(untitled)")
    )?;

    if let Some(category) = &broadcast.category {
        writeln!(f, "    Category: {category}")?;
    }
    if let Some(rating) = &broadcast.rating {
        writeln!(f, "    Rating: {rating}")?;
    }
    if let Some(series) = &broadcast.series
        && let Some(line) = series_line(series)
    {
        writeln!(f, "    Series: {line}")?;
    }
    if let Some(desc) = &broadcast.description {
        let desc = desc.as_str().trim();
        if !desc.is_empty() {
            writeln!(f, "    {desc}")?;
        }
    }

    Ok(())
}

fn time_or_unknown(ts: Option<Timestamp>) -> String {
    ts.map(|ts| ts.to_string()).unwrap_or_else(|| "?".to_string())
}

fn series_line(series: &SeriesInfo) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(season) = &series.season_num {
        parts.push(format!("S{season}"));
    }
    if let Some(episode) = &series.episode_num {
        parts.push(format!("E{episode}"));
    }
    if let Some(name) = &series.series_name {
        parts.push(name.to_string());
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}
