//! Capability probing.
//!
//! Probes run once per request. A spawn failure means "unavailable"; it is
//! never surfaced as an error.

use serde::Serialize;

use super::command::Toolkit;

/// Name of the high-quality time-stretch filter.
pub const RUBBERBAND_FILTER: &str = "rubberband";

impl Toolkit {
    /// Returns true if `ffmpeg -version` runs successfully.
    pub fn toolkit_available(&self) -> bool {
        self.capture(["-version"]).is_ok()
    }

    /// Returns true if ffmpeg lists a filter called `name`.
    pub fn filter_available(&self, name: &str) -> bool {
        match self.capture(["-hide_banner", "-filters"]) {
            Ok(stdout) => filter_listed(&String::from_utf8_lossy(&stdout), name),
            Err(e) => {
                log::debug!("filter probe for {} failed: {}", name, e);
                false
            }
        }
    }
}

/// Looks for `name` as the filter-name column of `ffmpeg -filters` output.
///
/// Lines look like ` TSC rubberband  A->A  Apply time-stretching...`.
fn filter_listed(listing: &str, name: &str) -> bool {
    listing.lines().any(|line| {
        let mut cols = line.split_whitespace();
        matches!((cols.next(), cols.next()), (Some(_), Some(col)) if col == name)
    })
}

/// What the host can do, probed once and passed to every consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// ffmpeg can be executed.
    pub toolkit: bool,

    /// The rubberband filter is compiled into ffmpeg.
    pub rubberband: bool,
}

impl Capabilities {
    /// Probes the host. The filter is only queried when ffmpeg itself runs.
    pub fn probe(toolkit: &Toolkit) -> Self {
        let available = toolkit.toolkit_available();
        let rubberband = available && toolkit.filter_available(RUBBERBAND_FILTER);
        log::debug!(
            "capabilities: toolkit={} rubberband={} ({})",
            available,
            rubberband,
            toolkit.program().display()
        );
        Self {
            toolkit: available,
            rubberband,
        }
    }

    /// No toolkit at all.
    pub fn none() -> Self {
        Self {
            toolkit: false,
            rubberband: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "Filters:
  T.. = Timeline support
  ... rubberband        A->A       Apply time-stretching and pitch-shifting.
  ... atempo            A->A       Adjust audio tempo.
";

    #[test]
    fn listing_matches_name_column_only() {
        assert!(filter_listed(LISTING, "rubberband"));
        assert!(filter_listed(LISTING, "atempo"));
        assert!(!filter_listed(LISTING, "tempo"));
        assert!(!filter_listed(LISTING, "time-stretching"));
        assert!(!filter_listed("", "rubberband"));
    }

    #[test]
    fn missing_toolkit_probes_unavailable() {
        let toolkit = Toolkit::new("/nonexistent/djmix-ffmpeg");
        assert!(!toolkit.toolkit_available());
        assert!(!toolkit.filter_available(RUBBERBAND_FILTER));
        assert_eq!(Capabilities::probe(&toolkit), Capabilities::none());
    }
}
