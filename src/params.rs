use std::fmt;

use serde_json::{Value, json};
use thiserror::Error;
use url::Url;

/// Path segment that precedes the report id.
const REPORTS_SEGMENT: &str = "reports";
/// Query value the host uses for "most recent fight".
const LAST_FIGHT: &str = "last";
pub const LAST_FIGHT_SENTINEL: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fight {
    Last,
    Id(String),
}

impl Fight {
    fn parse(raw: &str) -> Self {
        if raw == LAST_FIGHT {
            Fight::Last
        } else {
            Fight::Id(raw.to_owned())
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Fight::Last => json!(LAST_FIGHT_SENTINEL),
            Fight::Id(id) => json!(id),
        }
    }
}

impl fmt::Display for Fight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fight::Last => write!(f, "{LAST_FIGHT_SENTINEL}"),
            Fight::Id(id) => f.write_str(id),
        }
    }
}

/// What the analysis frame should currently show.
///
/// Built fresh from the location on every reconciliation pass; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportParams {
    pub fight: Fight,
    pub source: String,
    pub report: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("location is not a valid url: {0}")]
    InvalidUrl(String),
    #[error("no report id after /{REPORTS_SEGMENT}/")]
    MissingReport,
    #[error("missing `{0}` query parameter")]
    MissingParam(&'static str),
}

impl ReportParams {
    pub fn from_location(href: &str) -> Result<Self, ExtractError> {
        let url = Url::parse(href).map_err(|err| ExtractError::InvalidUrl(err.to_string()))?;
        let report = report_segment(&url).ok_or(ExtractError::MissingReport)?;
        let fight = query_value(&url, "fight").ok_or(ExtractError::MissingParam("fight"))?;
        let source = query_value(&url, "source").ok_or(ExtractError::MissingParam("source"))?;

        Ok(Self {
            fight: Fight::parse(&fight),
            source,
            report,
        })
    }

    /// Plain-data view used for change detection and status output.
    pub fn snapshot(&self) -> Value {
        json!({
            "fight": self.fight.to_value(),
            "source": self.source,
            "report": self.report,
        })
    }

    /// Address of the analysis app for these params, keyed like the snapshot.
    pub fn frame_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.query_pairs_mut()
            .append_pair("fight", &self.fight.to_string())
            .append_pair("source", &self.source)
            .append_pair("report", &self.report);
        url
    }
}

fn report_segment(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    segments.find(|segment| *segment == REPORTS_SEGMENT)?;
    segments
        .find(|segment| !segment.is_empty())
        .map(str::to_owned)
}

fn query_value(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
