//! GraphQL documents sent to AniList.

/// Media fields selected by every query that returns anime.
macro_rules! media_fields {
  () => {
    r#"
      id
      idMal
      title { romaji english native }
      coverImage { large extraLarge color }
      bannerImage
      description
      season
      seasonYear
      format
      status
      episodes
      duration
      genres
      isAdult
      averageScore
      popularity
      studios(isMain: true) { edges { node { id name } } }
      source
      nextAiringEpisode { airingAt timeUntilAiring episode }
    "#
  };
}

macro_rules! page_info {
  () => {
    "pageInfo { total perPage currentPage lastPage hasNextPage }"
  };
}

pub const SEARCH: &str = concat!(
  "query ($search: String, $page: Int, $perPage: Int) {",
  " Page(page: $page, perPage: $perPage) { ",
  page_info!(),
  " media(search: $search, type: ANIME, sort: POPULARITY_DESC) {",
  media_fields!(),
  "} } }"
);

pub const TRENDING: &str = concat!(
  "query ($page: Int, $perPage: Int) {",
  " Page(page: $page, perPage: $perPage) { ",
  page_info!(),
  " media(type: ANIME, sort: TRENDING_DESC, status: RELEASING) {",
  media_fields!(),
  "} } }"
);

pub const POPULAR: &str = concat!(
  "query ($page: Int, $perPage: Int) {",
  " Page(page: $page, perPage: $perPage) { ",
  page_info!(),
  " media(type: ANIME, sort: POPULARITY_DESC) {",
  media_fields!(),
  "} } }"
);

pub const UPCOMING: &str = concat!(
  "query ($page: Int, $perPage: Int) {",
  " Page(page: $page, perPage: $perPage) { ",
  page_info!(),
  " media(type: ANIME, status: NOT_YET_RELEASED, sort: POPULARITY_DESC) {",
  media_fields!(),
  "} } }"
);

pub const TOP_MOVIES: &str = concat!(
  "query ($page: Int, $perPage: Int) {",
  " Page(page: $page, perPage: $perPage) { ",
  page_info!(),
  " media(type: ANIME, format: MOVIE, sort: SCORE_DESC) {",
  media_fields!(),
  "} } }"
);

pub const BY_GENRE: &str = concat!(
  "query ($genre: String, $page: Int, $perPage: Int) {",
  " Page(page: $page, perPage: $perPage) { ",
  page_info!(),
  " media(genre: $genre, type: ANIME, sort: POPULARITY_DESC) {",
  media_fields!(),
  "} } }"
);

pub const BY_ID: &str = concat!(
  "query ($id: Int) { Media(id: $id, type: ANIME) {",
  media_fields!(),
  "} }"
);

pub const BY_MAL_ID: &str = concat!(
  "query ($idMal: Int) { Media(idMal: $idMal, type: ANIME) {",
  media_fields!(),
  "} }"
);

pub const GENRES: &str = "query { GenreCollection }";

pub const AIRING_SCHEDULE: &str = r#"
  query ($animeId: Int) {
    Media(id: $animeId) {
      id
      airingSchedule {
        nodes { episode airingAt timeUntilAiring }
      }
    }
  }
"#;
