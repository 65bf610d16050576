//! Command dispatch: run a parsed command against a `Context` and print the
//! result. Catalog outages are reported, not raised, so the caller can map
//! them to the exit status.

use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use tracing::debug;

use crate::cache::CacheStorage;
use crate::catalog::{released_episode_count, released_from_schedule, AniListClient, JikanClient};
use crate::cli::{Command, JikanCommand, Paging, WatchlistCommand};
use crate::context::Context;
use crate::display;
use crate::fetch::{FetchOutcome, QueryExecutor};
use crate::watchlist::{Source, WatchlistRecord};

/// How a command went, as far as remote data is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Ok,
  /// At least one remote lookup failed after its retries
  Degraded,
}

impl Status {
  fn and(self, other: Status) -> Status {
    if self == Status::Degraded || other == Status::Degraded {
      Status::Degraded
    } else {
      Status::Ok
    }
  }
}

/// Print `outcome`: `render` for success, a "nothing found" line for
/// `Empty`, a degraded-service message on stderr for `Failed`.
pub fn report<T>(
  out: &mut impl Write,
  err: &mut impl Write,
  what: &str,
  outcome: FetchOutcome<T>,
  render: impl FnOnce(T) -> Vec<String>,
) -> Result<Status> {
  match outcome {
    FetchOutcome::Success(data) => {
      let lines = render(data);
      if lines.is_empty() {
        writeln!(out, "No {} found.", what)?;
      }
      for line in lines {
        writeln!(out, "{}", line)?;
      }
      Ok(Status::Ok)
    }
    FetchOutcome::Empty => {
      writeln!(out, "No {} found.", what)?;
      Ok(Status::Ok)
    }
    FetchOutcome::Failed(reason) => {
      writeln!(
        err,
        "Could not load {}: the service is unavailable right now ({})",
        what, reason
      )?;
      Ok(Status::Degraded)
    }
  }
}

fn list_lines<T>(items: Vec<T>, line: impl Fn(&T) -> String) -> Vec<String> {
  items.iter().map(line).collect()
}

pub async fn run(ctx: &Context, command: Command) -> Result<Status> {
  let stdout = std::io::stdout();
  let stderr = std::io::stderr();
  let mut out = stdout.lock();
  let mut err = stderr.lock();

  match command {
    Command::Home => home(ctx, &mut out, &mut err).await,
    Command::Trending(Paging { page, per_page }) => report(
      &mut out,
      &mut err,
      "trending anime",
      ctx.anilist.trending(page, per_page).await,
      |list| list_lines(list, display::anime_line),
    ),
    Command::Popular(Paging { page, per_page }) => report(
      &mut out,
      &mut err,
      "popular anime",
      ctx.anilist.popular(page, per_page).await,
      |list| list_lines(list, display::anime_line),
    ),
    Command::Upcoming(Paging { page, per_page }) => report(
      &mut out,
      &mut err,
      "upcoming anime",
      ctx.anilist.upcoming(page, per_page).await,
      |list| list_lines(list, display::anime_line),
    ),
    Command::Movies(Paging { page, per_page }) => report(
      &mut out,
      &mut err,
      "movies",
      ctx.anilist.top_movies(page, per_page).await,
      |list| list_lines(list, display::anime_line),
    ),
    Command::Search { query, paging } => report(
      &mut out,
      &mut err,
      &format!("anime matching \"{}\"", query),
      ctx.anilist.search(&query, paging.page, paging.per_page).await,
      |list| list_lines(list, display::anime_line),
    ),
    Command::Genres => report(
      &mut out,
      &mut err,
      "genres",
      ctx.anilist.genres().await,
      |list| list_lines(list, display::genre_line),
    ),
    Command::Genre { name, paging } => report(
      &mut out,
      &mut err,
      &format!("{} anime", name),
      ctx.anilist.by_genre(&name, paging.page, paging.per_page).await,
      |list| list_lines(list, display::anime_line),
    ),
    Command::Show { id } => report(
      &mut out,
      &mut err,
      &format!("anime {}", id),
      ctx.anilist.anime(id).await,
      |anime| vec![display::anime_details(&anime, released_episode_count(&anime))],
    ),
    Command::Schedule { id } => {
      let now = Utc::now().timestamp();
      report(
        &mut out,
        &mut err,
        &format!("airing schedule for {}", id),
        ctx.anilist.airing_schedule(id).await,
        |slots| {
          if slots.is_empty() {
            return Vec::new();
          }
          let mut lines = vec![format!(
            "Released: {} of {}",
            released_from_schedule(&slots, now),
            slots.len()
          )];
          lines.extend(slots.iter().map(|slot| display::schedule_line(slot, now)));
          lines
        },
      )
    }
    Command::Jikan(command) => jikan(ctx, command, &mut out, &mut err).await,
    Command::Watchlist(command) => watchlist(ctx, command, &mut out, &mut err).await,
  }
}

async fn home(ctx: &Context, out: &mut impl Write, err: &mut impl Write) -> Result<Status> {
  let (trending, popular, upcoming, movies) = futures::join!(
    ctx.anilist.trending(1, 10),
    ctx.anilist.popular(1, 10),
    ctx.anilist.upcoming(1, 10),
    ctx.anilist.top_movies(1, 10),
  );

  let mut status = Status::Ok;
  for (heading, outcome) in [
    ("Trending now", trending),
    ("All-time popular", popular),
    ("Upcoming", upcoming),
    ("Top movies", movies),
  ] {
    writeln!(out, "== {} ==", heading)?;
    let section = report(out, err, &heading.to_lowercase(), outcome, |list| {
      list_lines(list, display::anime_line)
    })?;
    status = status.and(section);
    writeln!(out)?;
  }
  Ok(status)
}

async fn jikan(
  ctx: &Context,
  command: JikanCommand,
  out: &mut impl Write,
  err: &mut impl Write,
) -> Result<Status> {
  match command {
    JikanCommand::Search { query } => report(
      out,
      err,
      &format!("anime matching \"{}\"", query),
      ctx.jikan.search(&query).await,
      |list| list_lines(list, display::jikan_line),
    ),
    JikanCommand::Show { mal_id } => report(
      out,
      err,
      &format!("anime {}", mal_id),
      ctx.jikan.anime(mal_id).await,
      |anime| vec![display::jikan_details(&anime)],
    ),
    JikanCommand::Top { kind } => report(
      out,
      err,
      "top anime",
      ctx.jikan.top(kind.into()).await,
      |list| list_lines(list, display::jikan_line),
    ),
    JikanCommand::Upcoming => report(
      out,
      err,
      "anime for next season",
      ctx.jikan.upcoming(Utc::now().date_naive()).await,
      |list| list_lines(list, display::jikan_line),
    ),
    JikanCommand::Genres => {
      let genres = ctx.jikan.genres_or_fallback().await;
      for genre in &genres {
        writeln!(out, "{}", display::genre_line(genre))?;
      }
      Ok(Status::Ok)
    }
    JikanCommand::Genre { id } => report(
      out,
      err,
      &format!("anime in genre {}", id),
      ctx.jikan.by_genre(id).await,
      |list| list_lines(list, display::jikan_line),
    ),
  }
}

async fn watchlist(
  ctx: &Context,
  command: WatchlistCommand,
  out: &mut impl Write,
  err: &mut impl Write,
) -> Result<Status> {
  let user = ctx.user.as_str();
  let store = &ctx.watchlist;

  match command {
    WatchlistCommand::List => {
      let records = store.list(user)?;
      if records.is_empty() {
        writeln!(out, "The watchlist is empty.")?;
      }
      for record in &records {
        writeln!(out, "{}", display::record_line(record))?;
      }
      Ok(Status::Ok)
    }
    WatchlistCommand::Add { id, mal } => {
      let outcome = if mal {
        record_for_mal_id(&ctx.anilist, &ctx.jikan, id).await
      } else {
        ctx.anilist.anime(id).await.map(|a| WatchlistRecord::from_anime(&a))
      };

      match outcome {
        FetchOutcome::Success(record) => {
          let key = record.key();
          if store.contains(user, key)? {
            writeln!(out, "{} is already on the watchlist as {}.", record.title, key)?;
          } else {
            store.add(user, &record)?;
            writeln!(out, "Added {} to the watchlist as {}.", record.title, key)?;
          }
          Ok(Status::Ok)
        }
        other => report(out, err, &format!("anime {}", id), other, |_| Vec::new()),
      }
    }
    WatchlistCommand::Remove { entry } => {
      let key = entry.key();
      if store.remove(user, key)? {
        writeln!(out, "Removed {} from the watchlist.", key)?;
      } else {
        writeln!(out, "{} was not on the watchlist.", key)?;
      }
      Ok(Status::Ok)
    }
    WatchlistCommand::Show { entry, page } => {
      let record = store
        .get(user, entry.key())?
        .ok_or_else(|| eyre!("Anime {} is not on the watchlist", entry.key()))?;
      show_record(out, err, &ctx.jikan, &record, page.saturating_sub(1)).await
    }
    WatchlistCommand::Toggle { entry, episode } => {
      let watched = store.toggle_episode(user, entry.key(), episode)?;
      let state = if watched { "watched" } else { "unwatched" };
      writeln!(out, "Episode {} marked {}.", episode, state)?;
      Ok(Status::Ok)
    }
    WatchlistCommand::Mark { entry, through } => {
      let key = entry.key();
      let record = store
        .get(user, key)?
        .ok_or_else(|| eyre!("Anime {} is not on the watchlist", key))?;

      let through = match through {
        Some(n) => n,
        None => match key.source {
          Source::AniList => match ctx.anilist.by_anilist_id(key.id).await {
            FetchOutcome::Success(anime) => released_episode_count(&anime),
            FetchOutcome::Empty => {
              writeln!(out, "No anime {} found.", key)?;
              return Ok(Status::Ok);
            }
            FetchOutcome::Failed(reason) => {
              writeln!(
                err,
                "Could not determine released episodes for {}: {}",
                key, reason
              )?;
              return Ok(Status::Degraded);
            }
          },
          // Jikan has no airing countdown, so the stored total stands in
          Source::Mal => match record.total_episodes {
            Some(total) => total,
            None => {
              writeln!(
                out,
                "The episode count of {} is unknown; pass --through.",
                record.title
              )?;
              return Ok(Status::Ok);
            }
          },
        },
      };

      if through == 0 {
        writeln!(out, "No episodes have been released yet.")?;
        return Ok(Status::Ok);
      }

      let updated = store.mark_through(user, key, through)?;
      writeln!(
        out,
        "Marked episodes 1-{} watched ({} watched in total).",
        through.min(updated.last_episode()),
        updated.episodes_watched.len()
      )?;
      Ok(Status::Ok)
    }
  }
}

/// Build a record for a MyAnimeList id. AniList's entry wins when it has one,
/// otherwise the Jikan entry is kept under its MAL id. When neither lookup
/// succeeds a failure wins over `Empty`.
pub async fn record_for_mal_id<A, SA, J, SJ>(
  anilist: &AniListClient<A, SA>,
  jikan: &JikanClient<J, SJ>,
  mal_id: u64,
) -> FetchOutcome<WatchlistRecord>
where
  A: QueryExecutor,
  SA: CacheStorage,
  J: QueryExecutor,
  SJ: CacheStorage,
{
  let first = anilist
    .by_mal_id(mal_id)
    .await
    .map(|a| WatchlistRecord::from_anime(&a));
  if first.is_success() {
    return first;
  }

  debug!(mal_id, "no AniList match for MyAnimeList id, asking Jikan");
  let second = jikan
    .anime(mal_id)
    .await
    .map(|a| WatchlistRecord::from_jikan(&a));
  match (first, second) {
    (_, found @ FetchOutcome::Success(_)) => found,
    (_, failed @ FetchOutcome::Failed(_)) => failed,
    (failed @ FetchOutcome::Failed(_), _) => failed,
    _ => FetchOutcome::Empty,
  }
}

/// Progress line and episode grid page, followed by the MyAnimeList entry
/// when the record links one.
pub async fn show_record<E: QueryExecutor, S: CacheStorage>(
  out: &mut impl Write,
  err: &mut impl Write,
  jikan: &JikanClient<E, S>,
  record: &WatchlistRecord,
  page: u32,
) -> Result<Status> {
  writeln!(out, "{}", display::record_line(record))?;
  writeln!(
    out,
    "{}",
    display::episode_grid(record.total_episodes, &record.episodes_watched, page)
  )?;

  let Some(mal_id) = record.mal_id else {
    return Ok(Status::Ok);
  };
  writeln!(out)?;
  report(
    out,
    err,
    &format!("MyAnimeList entry {}", mal_id),
    jikan.anime(mal_id).await,
    |anime| vec![display::jikan_details(&anime)],
  )
}
