//! # epgview
//!
//! Decode XML television program guides into a typed model and render a
//! short, human-readable summary.
//!
//! ## Quick Start
//!
//! ```
//! use epgview::{decode_str, Summary};
//!
//! let guide = decode_str(
//!     r#"<tv><programme channel="1" id="a" start="20240101120000" stop="20240101130000">
//!          <title>News</title>
//!        </programme></tv>"#,
//! ).unwrap();
//!
//! let broadcast = &guide.broadcasts[0];
//! assert_eq!(broadcast.channel, "1");
//! assert_eq!(broadcast.title_str(), Some("News"));
//! assert!(broadcast.description.is_none());
//!
//! println!("{}", Summary::new("guide.xml", 120, &guide));
//! ```
//!
//! ## Document shape
//!
//! The root `tv` element holds `programme` elements, each with `channel`,
//! `id`, `start` and `stop` attributes and optional children. `start` and
//! `stop` are fourteen digits, `YYYYMMDDhhmmss`, with no zone. Unknown
//! elements and attributes are skipped.

pub mod epg;
pub mod error;
pub mod summary;

pub use epg::{Broadcast, Guide, SeriesInfo, Timestamp, decode, decode_str};
pub use error::{Error, Result};
pub use summary::{Summary, humanize_bytes};
