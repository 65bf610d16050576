use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::catalog::TopFilter;
use crate::watchlist::{RecordKey, MAX_EPISODE};

#[derive(Parser, Debug)]
#[command(name = "animedex")]
#[command(about = "Browse AniList and MyAnimeList from the terminal and track watched episodes")]
#[command(version)]
pub struct Cli {
  /// Path to config file (default: $XDG_CONFIG_HOME/animedex/config.yaml)
  #[arg(short, long, global = true)]
  pub config: Option<PathBuf>,

  /// Whose watchlist to use (overrides watchlist.user)
  #[arg(short, long, global = true)]
  pub user: Option<String>,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
  #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
  pub page: u32,

  #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..=50))]
  pub per_page: u32,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Trending, popular, upcoming and top movies at a glance
  Home,
  /// Currently airing shows sorted by trend
  Trending(Paging),
  /// Most popular of all time
  Popular(Paging),
  /// Not yet released
  Upcoming(Paging),
  /// Highest rated movies
  Movies(Paging),
  /// Search AniList by title
  Search {
    query: String,
    #[command(flatten)]
    paging: Paging,
  },
  /// List AniList genres
  Genres,
  /// Popular anime of one genre
  Genre {
    name: String,
    #[command(flatten)]
    paging: Paging,
  },
  /// Details for an AniList id (MyAnimeList ids are tried as a fallback)
  Show { id: u64 },
  /// Airing schedule of a show
  Schedule { id: u64 },
  /// Query MyAnimeList through Jikan
  #[command(subcommand)]
  Jikan(JikanCommand),
  /// Manage the watchlist
  #[command(subcommand)]
  Watchlist(WatchlistCommand),
}

#[derive(Subcommand, Debug)]
pub enum JikanCommand {
  Search { query: String },
  Show { mal_id: u64 },
  Top {
    #[arg(value_enum, default_value_t = TopKind::Airing)]
    kind: TopKind,
  },
  /// Next season's lineup
  Upcoming,
  Genres,
  Genre { id: u32 },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopKind {
  Airing,
  Popular,
  Movies,
}

impl From<TopKind> for TopFilter {
  fn from(kind: TopKind) -> Self {
    match kind {
      TopKind::Airing => TopFilter::Airing,
      TopKind::Popular => TopFilter::Popular,
      TopKind::Movies => TopFilter::Movies,
    }
  }
}

/// A watchlist entry as listed by `watchlist list`.
#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
  pub id: u64,
  /// The entry was added from MyAnimeList only (listed as mal:ID)
  #[arg(long)]
  pub mal: bool,
}

impl Entry {
  pub fn key(self) -> RecordKey {
    if self.mal {
      RecordKey::mal(self.id)
    } else {
      RecordKey::anilist(self.id)
    }
  }
}

#[derive(Subcommand, Debug)]
pub enum WatchlistCommand {
  /// Everything on the watchlist, newest first
  List,
  /// Add an anime by AniList id
  Add {
    id: u64,
    /// Treat the id as a MyAnimeList id: matched on AniList first, then
    /// looked up through Jikan
    #[arg(long)]
    mal: bool,
  },
  Remove {
    #[command(flatten)]
    entry: Entry,
  },
  /// Progress, episode grid and MyAnimeList details
  Show {
    #[command(flatten)]
    entry: Entry,
    /// Grid page (50 episodes per page)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
  },
  /// Flip an episode between watched and unwatched
  Toggle {
    #[command(flatten)]
    entry: Entry,
    #[arg(value_parser = clap::value_parser!(u32).range(1..=MAX_EPISODE as i64))]
    episode: u32,
  },
  /// Mark episodes 1..=N watched (default: every released episode)
  Mark {
    #[command(flatten)]
    entry: Entry,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_EPISODE as i64))]
    through: Option<u32>,
  },
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::CommandFactory;

  #[test]
  fn test_cli_is_well_formed() {
    Cli::command().debug_assert();
  }

  #[test]
  fn test_search_with_paging() {
    let cli = Cli::parse_from(["animedex", "search", "one piece", "--page", "2"]);
    match cli.command {
      Command::Search { query, paging } => {
        assert_eq!(query, "one piece");
        assert_eq!(paging, Paging { page: 2, per_page: 20 });
      }
      other => panic!("unexpected command: {:?}", other),
    }
  }

  #[test]
  fn test_global_user_after_subcommand() {
    let cli = Cli::parse_from(["animedex", "watchlist", "list", "--user", "alice"]);
    assert_eq!(cli.user.as_deref(), Some("alice"));
    assert!(matches!(cli.command, Command::Watchlist(WatchlistCommand::List)));
  }

  #[test]
  fn test_toggle_rejects_episode_zero() {
    assert!(Cli::try_parse_from(["animedex", "watchlist", "toggle", "1", "0"]).is_err());
  }

  #[test]
  fn test_per_page_is_bounded() {
    assert!(Cli::try_parse_from(["animedex", "trending", "--per-page", "500"]).is_err());
  }

  #[test]
  fn test_jikan_top_kind() {
    let cli = Cli::parse_from(["animedex", "jikan", "top", "movies"]);
    match cli.command {
      Command::Jikan(JikanCommand::Top { kind }) => {
        assert_eq!(TopFilter::from(kind), TopFilter::Movies)
      }
      other => panic!("unexpected command: {:?}", other),
    }
  }

  #[test]
  fn test_add_from_mal() {
    let cli = Cli::parse_from(["animedex", "watchlist", "add", "457", "--mal"]);
    assert!(matches!(
      cli.command,
      Command::Watchlist(WatchlistCommand::Add { id: 457, mal: true })
    ));
  }

  #[test]
  fn test_mark_through() {
    let cli = Cli::parse_from(["animedex", "watchlist", "mark", "5", "--through", "12"]);
    match cli.command {
      Command::Watchlist(WatchlistCommand::Mark { entry, through }) => {
        assert_eq!(entry.key(), RecordKey::anilist(5));
        assert_eq!(through, Some(12));
      }
      other => panic!("unexpected command: {:?}", other),
    }
  }

  #[test]
  fn test_mark_through_is_bounded() {
    let huge = (MAX_EPISODE + 1).to_string();
    assert!(
      Cli::try_parse_from(["animedex", "watchlist", "mark", "5", "--through", &huge]).is_err()
    );
    assert!(Cli::try_parse_from(["animedex", "watchlist", "toggle", "5", &huge]).is_err());
  }

  #[test]
  fn test_mal_entry_key() {
    let cli = Cli::parse_from(["animedex", "watchlist", "toggle", "457", "3", "--mal"]);
    match cli.command {
      Command::Watchlist(WatchlistCommand::Toggle { entry, episode }) => {
        assert_eq!(entry.key(), RecordKey::mal(457));
        assert_eq!(episode, 3);
      }
      other => panic!("unexpected command: {:?}", other),
    }
  }
}
