//! Remote anime catalogs: AniList (GraphQL) and Jikan (REST).

pub mod anilist;
pub mod api_types;
pub mod episodes;
pub mod jikan;
pub mod queries;
pub mod types;

pub use anilist::{AniListClient, AniListExecutor};
pub use episodes::{released_episode_count, released_from_schedule, trackable_episodes};
pub use jikan::{JikanAnime, JikanClient, JikanExecutor, TopFilter};
pub use types::{AiringSlot, Anime, Genre, MediaStatus, NextAiring, Title};
