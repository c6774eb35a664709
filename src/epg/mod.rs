//! Guide document model and decoding.

mod decoder;
mod model;
mod timestamp;

pub use decoder::{decode, decode_str};
pub use model::{
    Broadcast, Catchup, Category, Credits, Description, EpisodeNum, Format, Guide, Icon, Rating,
    Replay, SeasonNum, SeriesId, SeriesInfo, SeriesName, Title,
};
pub use timestamp::{Timestamp, TimestampError};
