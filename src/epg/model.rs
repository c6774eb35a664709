//! Typed guide entities.
//!
//! The tree mirrors the document: a [`Guide`] (`tv`) holds [`Broadcast`]s
//! (`programme`), and each broadcast holds optional leaf values. A child
//! that is missing from the document is `None`; a child that is present but
//! empty is `Some` holding the empty string.

use std::fmt;
use std::str::FromStr;

use super::Timestamp;
use crate::error::{Error, Result};

/// A decoded guide document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Guide {
    /// Broadcasts in document order.
    #[cfg_attr(feature = "serde", serde(rename = "programme"))]
    pub broadcasts: Vec<Broadcast>,
}

impl Guide {
    pub fn len(&self) -> usize {
        self.broadcasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.broadcasts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Broadcast> {
        self.broadcasts.iter()
    }
}

impl<'a> IntoIterator for &'a Guide {
    type Item = &'a Broadcast;
    type IntoIter = std::slice::Iter<'a, Broadcast>;

    fn into_iter(self) -> Self::IntoIter {
        self.broadcasts.iter()
    }
}

impl FromStr for Guide {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        super::decode_str(s)
    }
}

/// One scheduled programme on a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub struct Broadcast {
    pub channel: String,
    pub id: String,
    pub start: Option<Timestamp>,
    pub stop: Option<Timestamp>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub catchup: Option<Catchup>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub category: Option<Category>,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "cna-rating", skip_serializing_if = "Option::is_none")
    )]
    pub rating: Option<Rating>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub credits: Option<Credits>,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "desc", skip_serializing_if = "Option::is_none")
    )]
    pub description: Option<Description>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub format: Option<Format>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub icon: Option<Icon>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub replay: Option<Replay>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub series: Option<SeriesInfo>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub title: Option<Title>,
}

impl Broadcast {
    pub fn title_str(&self) -> Option<&str> {
        self.title.as_ref().map(Title::as_str)
    }

    /// Length of the time window, when both ends are known.
    pub fn duration(&self) -> Option<chrono::TimeDelta> {
        Some(self.stop?.naive() - self.start?.naive())
    }
}

/// Episode and season metadata (`series`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub struct SeriesInfo {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub episode_num: Option<EpisodeNum>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub season_num: Option<SeasonNum>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub series_id: Option<SeriesId>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub series_name: Option<SeriesName>,
}

/// Programme artwork. Only the `src` attribute is modeled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Icon {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub src: Option<String>,
}

/// Presence marker for `credits`; its content is not modeled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Credits {}

/// Declares a newtype over the character data of a leaf element.
macro_rules! text_value {
    ($($(#[$meta:meta])* $name:ident;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
            #[cfg_attr(feature = "serde", derive(serde::Serialize))]
            #[cfg_attr(feature = "serde", serde(transparent))]
            pub struct $name(pub String);

            impl $name {
                pub fn as_str(&self) -> &str {
                    &self.0
                }

                pub fn into_inner(self) -> String {
                    self.0
                }
            }

            impl From<String> for $name {
                fn from(text: String) -> Self {
                    $name(text)
                }
            }

            impl From<&str> for $name {
                fn from(text: &str) -> Self {
                    $name(text.to_string())
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )+
    };
}

text_value! {
    /// Catch-up availability (`catchup`).
    Catchup;
    /// Genre (`category`).
    Category;
    /// Content rating (`cna-rating`).
    Rating;
    /// Synopsis (`desc`).
    Description;
    /// Picture or broadcast format (`format`).
    Format;
    /// Replay availability (`replay`).
    Replay;
    EpisodeNum;
    SeasonNum;
    SeriesId;
    SeriesName;
    /// Programme name (`title`).
    Title;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_value_accessors() {
        let title = Title::from("News");
        assert_eq!(title.as_str(), "News");
        assert_eq!(title.to_string(), "News");
        assert_eq!(title.into_inner(), "News".to_string());
    }

    #[test]
    fn test_duration() {
        let mut broadcast = Broadcast {
            start: Some(Timestamp::parse("20240101120000").unwrap()),
            ..Default::default()
        };
        assert_eq!(broadcast.duration(), None);

        broadcast.stop = Some(Timestamp::parse("20240101133000").unwrap());
        assert_eq!(broadcast.duration(), Some(chrono::TimeDelta::minutes(90)));
    }

    #[test]
    fn test_guide_iteration() {
        let guide = Guide {
            broadcasts: vec![
                Broadcast {
                    id: "a".into(),
                    ..Default::default()
                },
                Broadcast {
                    id: "b".into(),
                    ..Default::default()
                },
            ],
        };
        let ids: Vec<_> = guide.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(guide.len(), 2);
        assert!(!guide.is_empty());
        assert!(Guide::default().is_empty());
    }
}
