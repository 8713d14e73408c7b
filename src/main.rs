use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use clap::{value_parser, Arg, ArgMatches, Command};
use thiserror::Error;
use tokio::sync::mpsc;

use soundspace::actions::artists::{followed_artists, tracks_from_top_artists};
use soundspace::actions::feed::build_feed;
use soundspace::actions::library::{recently_played, top_tracks, TimeRange};
use soundspace::actions::recommendations::recommendations;
use soundspace::actions::releases::new_releases_from_followed_artists;
use soundspace::authorize::{self, AuthorizeError, LoginState};
use soundspace::config::{ConfigError, DEFAULT_CONFIG_PATH};
use soundspace::logging;
use soundspace::models::artist::Artist;
use soundspace::models::track::Track;
use soundspace::player::{devices, Player};
use soundspace::storage::{FileStore, StorageError, TokenStore};
use soundspace::{ApiClient, ApiError, Session, SoundspaceConfig};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Authorize(#[from] AuthorizeError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Login server failed: {0}")]
    Server(String),
    #[error("Not logged in, run `soundspace login` first.")]
    NotAuthenticated,
    #[error("{0}")]
    Usage(String),
}

fn limit_arg() -> Arg {
    Arg::new("limit")
        .short('l')
        .long("limit")
        .value_parser(value_parser!(u32))
        .default_value("20")
}

fn cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .default_value(DEFAULT_CONFIG_PATH),
        )
        .subcommand(Command::new("login").about("Connect a Spotify account in the browser"))
        .subcommand(Command::new("logout").about("Forget the stored tokens"))
        .subcommand(Command::new("status").about("Show whether a valid session exists"))
        .subcommand(Command::new("refresh").about("Trade the refresh token for a new access token"))
        .subcommand(Command::new("me").about("Show the connected user"))
        .subcommand(
            Command::new("top")
                .about("Top tracks")
                .arg(limit_arg())
                .arg(
                    Arg::new("range")
                        .short('r')
                        .long("range")
                        .value_parser(["short", "medium", "long"])
                        .default_value("medium"),
                ),
        )
        .subcommand(Command::new("recent").about("Recently played tracks").arg(limit_arg()))
        .subcommand(Command::new("artists").about("Followed artists").arg(limit_arg()))
        .subcommand(
            Command::new("top-artist-tracks")
                .about("Top tracks of your top artists")
                .arg(limit_arg()),
        )
        .subcommand(
            Command::new("releases")
                .about("New releases from followed artists")
                .arg(limit_arg()),
        )
        .subcommand(Command::new("recommendations").about("Recommended tracks").arg(limit_arg()))
        .subcommand(Command::new("feed").about("Merged listening feed").arg(limit_arg()))
        .subcommand(Command::new("devices").about("Available playback devices"))
        .subcommand(
            Command::new("play")
                .about("Play a track uri on the playback device")
                .arg(Arg::new("uri").required(true)),
        )
        .subcommand(Command::new("pause").about("Pause playback"))
        .subcommand(Command::new("resume").about("Resume playback"))
        .subcommand(Command::new("toggle").about("Toggle play/pause"))
        .subcommand(
            Command::new("seek")
                .about("Seek to a position in milliseconds")
                .arg(Arg::new("position").required(true).value_parser(value_parser!(u64))),
        )
        .subcommand(
            Command::new("volume")
                .about("Set the volume in percent")
                .arg(
                    Arg::new("percent")
                        .required(true)
                        .value_parser(value_parser!(u8).range(0..=100)),
                ),
        )
        .subcommand(Command::new("next").about("Skip to the next track"))
        .subcommand(Command::new("previous").about("Skip to the previous track"))
}

fn limit(matches: &ArgMatches) -> u32 {
    matches.get_one::<u32>("limit").copied().unwrap_or(20)
}

fn print_tracks(tracks: &[Track]) {
    if tracks.is_empty() {
        println!("No tracks.");
    }
    for (i, track) in tracks.iter().enumerate() {
        println!("{:>3}. {} - {} ({})", i + 1, track.name, track.artist_names(), track.uri);
    }
}

fn print_artists(artists: &[Artist]) {
    if artists.is_empty() {
        println!("No artists.");
    }
    for (i, artist) in artists.iter().enumerate() {
        println!("{:>3}. {}", i + 1, artist.name);
    }
}

fn open_session(matches: &ArgMatches) -> Result<Arc<Session>, CliError> {
    let config_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = SoundspaceConfig::load(&config_path)?;
    let tokens = TokenStore::new(FileStore::open(&config.token_path)?);
    Ok(Arc::new(Session::new(config, tokens)))
}

async fn login(session: Arc<Session>) -> Result<(), CliError> {
    let state = authorize::random_state();
    let url = session.login_url(&state)?;
    let config = session.config();
    println!(
        "Open http://{}:{}/login in your browser to connect Spotify.",
        config.address, config.port
    );
    println!("Direct link: {}", url);
    if !config.redirect_reaches_server() {
        eprintln!(
            "Warning: redirect uri {} does not point at http://{}:{}/auth/callback, the login may not complete.",
            config.redirect_uri, config.address, config.port
        );
    }

    authorize::callback_server(session.clone(), LoginState(state))
        .launch()
        .await
        .map_err(|err| CliError::Server(err.to_string()))?;

    match session.user() {
        Some(user) => println!("Logged in as {}.", user.name()),
        None if session.is_authenticated() => println!("Logged in."),
        None => println!("Login was not completed, try again."),
    }
    Ok(())
}

/// A player bound to the configured device, with the current playback
/// state loaded.
async fn bound_player(session: &Session, client: &ApiClient) -> Player {
    let player = Player::new(client.clone());
    let (tx, rx) = mpsc::unbounded_channel();
    let listener = player.spawn_listener(rx);
    devices::connect(client, &session.config().device_name, None, &tx).await;
    devices::poll_state(client, &tx).await;
    drop(tx);
    if let Err(err) = listener.await {
        tracing::error!(error = %err, "Player listener failed");
    }
    player
}

async fn run(matches: ArgMatches) -> Result<(), CliError> {
    let session = open_session(&matches)?;
    let Some((name, sub)) = matches.subcommand() else {
        return Err(CliError::Usage("missing subcommand".to_string()));
    };

    match name {
        "login" => return login(session).await,
        "logout" => {
            session.logout()?;
            println!("Logged out.");
            return Ok(());
        }
        "status" => {
            match (session.is_authenticated(), session.expires_at()) {
                (true, Some(expires_at)) => {
                    let expiry = Utc
                        .timestamp_millis_opt(expires_at)
                        .single()
                        .map(|at| at.to_rfc3339())
                        .unwrap_or_else(|| expires_at.to_string());
                    println!("Authenticated, token expires at {}.", expiry);
                }
                (false, Some(_)) => println!("Token expired, run `refresh` or `login`."),
                _ => println!("Not logged in."),
            }
            return Ok(());
        }
        "refresh" => {
            session.refresh_tokens().await?;
            println!("Access token refreshed.");
            return Ok(());
        }
        _ => {}
    }

    let client = session.api_client().ok_or(CliError::NotAuthenticated)?;
    match name {
        "me" => {
            if !session.refresh_auth_state().await {
                return Err(CliError::NotAuthenticated);
            }
            if let Some(user) = session.user() {
                println!("{} ({})", user.name(), user.id);
                if let Some(product) = &user.product {
                    println!("Plan: {}", product);
                }
                println!("Followers: {}", user.followers.total);
            }
        }
        "top" => {
            let range = sub
                .get_one::<String>("range")
                .map(|range| range.parse::<TimeRange>())
                .transpose()
                .map_err(CliError::Usage)?
                .unwrap_or_default();
            print_tracks(&top_tracks(&client, range, limit(sub)).await);
        }
        "recent" => print_tracks(&recently_played(&client, limit(sub)).await),
        "artists" => print_artists(&followed_artists(&client, limit(sub)).await),
        "top-artist-tracks" => print_tracks(&tracks_from_top_artists(&client, limit(sub)).await),
        "releases" => {
            print_tracks(&new_releases_from_followed_artists(&client, limit(sub)).await)
        }
        "recommendations" => print_tracks(&recommendations(&client, limit(sub)).await),
        "feed" => {
            let user = session.refresh_user().await;
            let feed = build_feed(&client, user.as_ref(), limit(sub) as usize).await;
            if feed.is_empty() {
                println!("Nothing in your feed yet.");
            }
            for item in feed {
                let shared_by = item
                    .shared_by
                    .map(|name| format!(", shared by {}", name))
                    .unwrap_or_default();
                println!(
                    "[{}] {} - {}{}",
                    item.source,
                    item.track.name,
                    item.track.artist_names(),
                    shared_by
                );
            }
        }
        "devices" => {
            let devices = devices::list_devices(&client).await?;
            if devices.is_empty() {
                println!("No devices available.");
            }
            for device in devices {
                println!(
                    "{} [{}]{} {}",
                    device.name,
                    device.device_type,
                    if device.is_active { " (active)" } else { "" },
                    device.id.unwrap_or_default()
                );
            }
        }
        command => {
            let player = bound_player(&session, &client).await;
            match command {
                "play" => {
                    let uri = sub
                        .get_one::<String>("uri")
                        .ok_or_else(|| CliError::Usage("missing uri".to_string()))?;
                    player.play_uri(uri).await?;
                }
                "pause" => player.pause().await?,
                "resume" => player.resume().await?,
                "toggle" => player.toggle_play().await?,
                "seek" => {
                    let position = sub.get_one::<u64>("position").copied().unwrap_or(0);
                    player.seek(position).await?;
                }
                "volume" => {
                    let percent = sub.get_one::<u8>("percent").copied().unwrap_or(50);
                    player.set_volume(percent).await?;
                }
                "next" => player.next_track().await?,
                "previous" => player.previous_track().await?,
                other => return Err(CliError::Usage(format!("unknown command `{other}`"))),
            }
            let state = player.state();
            if let Some(device_id) = state.device_id {
                println!("Done on device {}.", device_id);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let _guard = match logging::init_logging() {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: Failed to initialize logging: {}", err);
            None
        }
    };

    match run(cli().get_matches()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
