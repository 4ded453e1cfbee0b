// Terminal shell
// Reads one command per line, runs it, prints the result
//
// The shell plays the part of the app's screens: home (trending), search,
// liked songs, library (playlists) and profile. It only talks to the shared
// pieces: the catalog for tracks, the library for account actions and the
// playback coordinator for what's playing. The player bar prints playback
// changes on its own.
//
// Error handling follows one rule:
// - auth and input problems are printed so the user can fix them
// - anything else is logged and the shell carries on as if nothing happened

use chrono::{Local, Timelike};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tracing::warn;

use super::command::{Command, HELP};
use super::output::SharedOutput;
use crate::backend::Playlist;
use crate::error::BackendError;
use crate::library::Library;
use crate::player::{PlaybackCoordinator, Track};
use crate::youtube::{MediaCatalog, SearchOutcome, SearchSession};

pub fn greeting(hour: u32) -> &'static str {
    if hour < 12 {
        "Good morning"
    } else if hour < 18 {
        "Good afternoon"
    } else {
        "Good evening"
    }
}

pub struct Shell<W> {
    catalog: Arc<dyn MediaCatalog>,
    search: SearchSession,
    library: Library,
    player: PlaybackCoordinator,
    out: SharedOutput<W>,
    // Last list of tracks printed, what "play <n>" picks from
    listing: Vec<Track>,
    // Last list of playlists printed, what "playlist ... <n>" picks from
    playlists: Vec<Playlist>,
}

impl<W: AsyncWrite + Unpin> Shell<W> {
    pub fn new(
        catalog: Arc<dyn MediaCatalog>,
        library: Library,
        player: PlaybackCoordinator,
        min_query_len: usize,
        out: SharedOutput<W>,
    ) -> Self {
        Shell {
            search: SearchSession::new(catalog.clone(), min_query_len),
            catalog,
            library,
            player,
            out,
            listing: Vec::new(),
            playlists: Vec::new(),
        }
    }

    pub fn listing(&self) -> &[Track] {
        &self.listing
    }

    pub fn into_output(self) -> Option<W> {
        self.out.into_inner()
    }

    async fn say(&mut self, text: &str) -> io::Result<()> {
        self.out.write_line(text).await
    }

    // ==========================================
    // MAIN LOOP
    // ==========================================

    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> io::Result<()> {
        self.home().await?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match Command::parse(&line) {
                Ok(command) => {
                    if !self.execute(command).await? {
                        break;
                    }
                }
                Err(usage) => self.say(&usage).await?,
            }
        }
        Ok(())
    }

    // Home screen: greeting plus trending tracks
    async fn home(&mut self) -> io::Result<()> {
        let mut line = greeting(Local::now().hour()).to_string();
        if self.library.session().is_signed_in() {
            match self.library.profile().await {
                Ok(profile) => {
                    if let Some(name) = profile.username {
                        line = format!("{line}, {name}");
                    }
                }
                Err(e) => warn!("Error loading profile: {}", e),
            }
        }
        self.say(&line).await?;
        self.say("Type 'help' for commands").await?;
        self.show_trending().await
    }

    // Returns false when the user asked to quit
    pub async fn execute(&mut self, command: Command) -> io::Result<bool> {
        match command {
            Command::Trending => self.show_trending().await?,
            Command::Search(keyword) => self.run_search(&keyword).await?,
            Command::Play(n) => self.play(n).await?,
            Command::Pause => {
                self.player.set_playing(false);
            }
            Command::Resume => {
                if !self.player.set_playing(true) {
                    self.say("Nothing selected, use 'play <n>' first").await?;
                }
            }
            Command::Toggle => {
                if self.player.current_track().is_none() {
                    self.say("Nothing selected, use 'play <n>' first").await?;
                } else {
                    self.player.toggle_playing();
                }
            }
            Command::Stop => self.player.clear(),
            Command::Open => self.open_current().await?,
            Command::Like => self.toggle_like().await?,
            Command::Liked => self.show_liked().await?,
            Command::Playlists => self.show_playlists().await?,
            Command::PlaylistNew { name, description } => {
                self.create_playlist(&name, description.as_deref()).await?
            }
            Command::PlaylistAdd(n) => self.add_to_playlist(n).await?,
            Command::PlaylistShow(n) => self.show_playlist(n).await?,
            Command::PlaylistRemove(n) => self.remove_from_playlist(n).await?,
            Command::PlaylistDelete(n) => self.delete_playlist(n).await?,
            Command::SignUp {
                email,
                password,
                name,
            } => {
                let result = self.library.sign_up(&email, &password, &name).await;
                match result {
                    Ok(_) => self.say(&format!("Welcome, {name}!")).await?,
                    Err(e) => self.report(e).await?,
                }
            }
            Command::Login { email, password } => {
                let result = self.library.sign_in(&email, &password).await;
                match result {
                    Ok(_) => self.home().await?,
                    Err(e) => self.report(e).await?,
                }
            }
            Command::Logout => {
                if let Err(e) = self.library.sign_out().await {
                    warn!("Error signing out: {}", e);
                }
                self.playlists.clear();
                self.say("Logged out").await?;
            }
            Command::Profile => self.show_profile().await?,
            Command::Rename(name) => {
                let result = self.library.rename(&name).await;
                match result {
                    Ok(_) => self.show_profile().await?,
                    Err(e) => self.report(e).await?,
                }
            }
            Command::Help => self.say(HELP).await?,
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    async fn report(&mut self, error: BackendError) -> io::Result<()> {
        if error.is_user_facing() {
            self.say(&error.to_string()).await
        } else {
            warn!("{}", error);
            Ok(())
        }
    }

    // ==========================================
    // TRACK LISTS
    // ==========================================

    async fn show_tracks(&mut self, title: &str, tracks: Vec<Track>) -> io::Result<()> {
        self.listing = tracks;
        let mut text = format!("{title}:");
        if self.listing.is_empty() {
            text.push_str("\n  (nothing here)");
        }
        for (i, track) in self.listing.iter().enumerate() {
            text.push_str(&format!("\n  {:>2}. {}", i + 1, track.display_line()));
        }
        self.say(&text).await
    }

    async fn show_trending(&mut self) -> io::Result<()> {
        let tracks = self.catalog.trending().await;
        self.show_tracks("Trending", tracks).await
    }

    async fn run_search(&mut self, keyword: &str) -> io::Result<()> {
        match self.search.search(keyword).await {
            SearchOutcome::Applied(tracks) => {
                self.show_tracks(&format!("Results for \"{}\"", keyword.trim()), tracks)
                    .await
            }
            SearchOutcome::Skipped => {
                self.say("Type at least a few more characters to search").await
            }
            SearchOutcome::Superseded => Ok(()),
        }
    }

    async fn play(&mut self, n: usize) -> io::Result<()> {
        let track = n.checked_sub(1).and_then(|i| self.listing.get(i)).cloned();
        match track {
            Some(track) => {
                self.player.select(track);
                Ok(())
            }
            None => self.say(&format!("No track {n} in the current list")).await,
        }
    }

    async fn open_current(&mut self) -> io::Result<()> {
        let Some(track) = self.player.current_track() else {
            return self.say("Nothing selected").await;
        };
        if let Err(e) = open::that(track.watch_url()) {
            warn!("Failed to open browser: {}", e);
            return self.say(&format!("Open {} to watch", track.watch_url())).await;
        }
        Ok(())
    }

    // ==========================================
    // LIKED SONGS
    // ==========================================

    async fn toggle_like(&mut self) -> io::Result<()> {
        let Some(track) = self.player.current_track() else {
            return self.say("Nothing selected").await;
        };
        let result = self.library.toggle_like(&track).await;
        match result {
            Ok(true) => self.say(&format!("♥ Liked {}", track.title)).await,
            Ok(false) => self.say(&format!("Removed {} from Liked Songs", track.title)).await,
            Err(e) => self.report(e).await,
        }
    }

    async fn show_liked(&mut self) -> io::Result<()> {
        let result = self.library.liked_songs().await;
        match result {
            Ok(tracks) => self.show_tracks("Liked Songs", tracks).await,
            Err(e) => self.report(e).await,
        }
    }

    // ==========================================
    // PLAYLISTS
    // ==========================================

    async fn show_playlists(&mut self) -> io::Result<()> {
        let result = self.library.playlists().await;
        let playlists = match result {
            Ok(playlists) => playlists,
            Err(e) => return self.report(e).await,
        };

        let mut text = "Your Library:".to_string();
        if playlists.is_empty() {
            text.push_str("\n  (no playlists yet, try 'playlist new <name>')");
        }
        for (i, playlist) in playlists.iter().enumerate() {
            text.push_str(&format!("\n  {:>2}. {}", i + 1, playlist.name));
            if let Some(description) = &playlist.description {
                text.push_str(&format!(" - {description}"));
            }
        }
        self.playlists = playlists;
        self.say(&text).await
    }

    fn playlist_at(&self, n: usize) -> Option<Playlist> {
        n.checked_sub(1).and_then(|i| self.playlists.get(i)).cloned()
    }

    async fn create_playlist(&mut self, name: &str, description: Option<&str>) -> io::Result<()> {
        let result = self.library.create_playlist(name, description).await;
        match result {
            Ok(_) => self.show_playlists().await,
            Err(e) => self.report(e).await,
        }
    }

    async fn add_to_playlist(&mut self, n: usize) -> io::Result<()> {
        let Some(track) = self.player.current_track() else {
            return self.say("Nothing selected").await;
        };
        let Some(playlist) = self.playlist_at(n) else {
            return self.say(&format!("No playlist {n}, run 'playlists' first")).await;
        };
        let result = self.library.add_to_playlist(&playlist.id, &track).await;
        match result {
            Ok(()) => {
                self.say(&format!("Added {} to {}", track.title, playlist.name))
                    .await
            }
            Err(e) => self.report(e).await,
        }
    }

    async fn remove_from_playlist(&mut self, n: usize) -> io::Result<()> {
        let Some(track) = self.player.current_track() else {
            return self.say("Nothing selected").await;
        };
        let Some(playlist) = self.playlist_at(n) else {
            return self.say(&format!("No playlist {n}, run 'playlists' first")).await;
        };
        let result = self.library.remove_from_playlist(&playlist.id, &track.id).await;
        match result {
            Ok(()) => {
                self.say(&format!("Removed {} from {}", track.title, playlist.name))
                    .await
            }
            Err(e) => self.report(e).await,
        }
    }

    async fn show_playlist(&mut self, n: usize) -> io::Result<()> {
        let Some(playlist) = self.playlist_at(n) else {
            return self.say(&format!("No playlist {n}, run 'playlists' first")).await;
        };
        let result = self.library.playlist_tracks(&playlist.id).await;
        match result {
            Ok(tracks) => self.show_tracks(&playlist.name, tracks).await,
            Err(e) => self.report(e).await,
        }
    }

    async fn delete_playlist(&mut self, n: usize) -> io::Result<()> {
        let Some(playlist) = self.playlist_at(n) else {
            return self.say(&format!("No playlist {n}, run 'playlists' first")).await;
        };
        let result = self.library.delete_playlist(&playlist.id).await;
        match result {
            Ok(()) => self.show_playlists().await,
            Err(e) => self.report(e).await,
        }
    }

    // ==========================================
    // PROFILE
    // ==========================================

    async fn show_profile(&mut self) -> io::Result<()> {
        let result = self.library.profile().await;
        let profile = match result {
            Ok(profile) => profile,
            Err(e) => return self.report(e).await,
        };

        let email = self
            .library
            .session()
            .current()
            .and_then(|s| s.email)
            .unwrap_or_default();
        let text = format!(
            "Profile:\n  Name:   {}\n  Email:  {}\n  Avatar: {}",
            profile.username.as_deref().unwrap_or("User"),
            email,
            profile.avatar_url.as_deref().unwrap_or("-"),
        );
        self.say(&text).await
    }
}
