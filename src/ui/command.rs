// Shell commands
//
// One command per input line. List positions are 1-based, as printed.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Trending,
    Search(String),
    Play(usize),
    Pause,
    Resume,
    Toggle,
    Stop,
    Open,
    Like,
    Liked,
    Playlists,
    PlaylistNew {
        name: String,
        description: Option<String>,
    },
    PlaylistAdd(usize),
    PlaylistShow(usize),
    PlaylistDelete(usize),
    PlaylistRemove(usize),
    SignUp {
        email: String,
        password: String,
        name: String,
    },
    Login {
        email: String,
        password: String,
    },
    Logout,
    Profile,
    Rename(String),
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  trending                         Show trending music
  search <keyword>                 Search (at least 3 characters)
  play <n>                         Play track n of the last list
  pause | resume | toggle | stop   Control playback
  open                             Open the current track in your browser
  like                             Like / unlike the current track
  liked                            Show your liked songs
  playlists                        Show your playlists
  playlist new <name> [| desc]     Create a playlist
  playlist add <n>                 Add the current track to playlist n
  playlist show <n>                Show the tracks of playlist n
  playlist remove <n>              Remove the current track from playlist n
  playlist delete <n>              Delete playlist n
  signup <email> <password> <name> Create an account
  login <email> <password>         Log in
  logout                           Log out
  profile                          Show your profile
  rename <name>                    Change your display name
  help                             Show this help
  quit                             Exit";

fn position(arg: Option<&str>, usage: &str) -> Result<usize, String> {
    match arg.map(str::parse::<usize>) {
        Some(Ok(n)) if n > 0 => Ok(n),
        _ => Err(format!("Usage: {usage}")),
    }
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let mut args = rest.split_whitespace();

        let command = match word.to_lowercase().as_str() {
            "trending" | "home" => Command::Trending,
            "search" | "s" => Command::Search(rest.to_string()),
            "play" | "p" => Command::Play(position(args.next(), "play <n>")?),
            "pause" => Command::Pause,
            "resume" => Command::Resume,
            "toggle" | "space" => Command::Toggle,
            "stop" => Command::Stop,
            "open" => Command::Open,
            "like" => Command::Like,
            "liked" => Command::Liked,
            "playlists" | "library" => Command::Playlists,
            "playlist" => return Self::parse_playlist(rest),
            "signup" => {
                let (Some(email), Some(password)) = (args.next(), args.next()) else {
                    return Err("Usage: signup <email> <password> <name>".to_string());
                };
                let name = args.collect::<Vec<_>>().join(" ");
                if name.is_empty() {
                    return Err("Usage: signup <email> <password> <name>".to_string());
                }
                Command::SignUp {
                    email: email.to_string(),
                    password: password.to_string(),
                    name,
                }
            }
            "login" => {
                let (Some(email), Some(password)) = (args.next(), args.next()) else {
                    return Err("Usage: login <email> <password>".to_string());
                };
                Command::Login {
                    email: email.to_string(),
                    password: password.to_string(),
                }
            }
            "logout" => Command::Logout,
            "profile" | "me" => Command::Profile,
            "rename" => {
                if rest.is_empty() {
                    return Err("Usage: rename <name>".to_string());
                }
                Command::Rename(rest.to_string())
            }
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("Unknown command '{other}', type 'help'")),
        };
        Ok(command)
    }

    fn parse_playlist(rest: &str) -> Result<Command, String> {
        let (action, arg) = match rest.split_once(char::is_whitespace) {
            Some((action, arg)) => (action, arg.trim()),
            None => (rest, ""),
        };

        match action {
            "new" | "create" => {
                let (name, description) = match arg.split_once('|') {
                    Some((name, desc)) => (name.trim(), Some(desc.trim().to_string())),
                    None => (arg, None),
                };
                if name.is_empty() {
                    return Err("Usage: playlist new <name> [| description]".to_string());
                }
                Ok(Command::PlaylistNew {
                    name: name.to_string(),
                    description,
                })
            }
            "add" => Ok(Command::PlaylistAdd(position(Some(arg), "playlist add <n>")?)),
            "show" => Ok(Command::PlaylistShow(position(Some(arg), "playlist show <n>")?)),
            "remove" => Ok(Command::PlaylistRemove(position(
                Some(arg),
                "playlist remove <n>",
            )?)),
            "delete" => Ok(Command::PlaylistDelete(position(
                Some(arg),
                "playlist delete <n>",
            )?)),
            _ => Err("Usage: playlist new|add|show|remove|delete ...".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_commands() {
        assert_eq!(Command::parse("trending"), Ok(Command::Trending));
        assert_eq!(Command::parse("  PAUSE "), Ok(Command::Pause));
        assert_eq!(Command::parse("q"), Ok(Command::Quit));
    }

    #[test]
    fn search_keeps_the_whole_keyword() {
        assert_eq!(
            Command::parse("search  daft punk  "),
            Ok(Command::Search("daft punk".to_string()))
        );
        assert_eq!(Command::parse("search"), Ok(Command::Search(String::new())));
    }

    #[test]
    fn positions_are_one_based() {
        assert_eq!(Command::parse("play 3"), Ok(Command::Play(3)));
        assert!(Command::parse("play 0").is_err());
        assert!(Command::parse("play x").is_err());
        assert!(Command::parse("play").is_err());
    }

    #[test]
    fn signup_name_may_contain_spaces() {
        assert_eq!(
            Command::parse("signup a@b.com secret1 Ann Lee"),
            Ok(Command::SignUp {
                email: "a@b.com".into(),
                password: "secret1".into(),
                name: "Ann Lee".into(),
            })
        );
        assert!(Command::parse("signup a@b.com secret1").is_err());
    }

    #[test]
    fn playlist_subcommands() {
        assert_eq!(
            Command::parse("playlist new Road trip | songs for the car"),
            Ok(Command::PlaylistNew {
                name: "Road trip".into(),
                description: Some("songs for the car".into()),
            })
        );
        assert_eq!(
            Command::parse("playlist new Chill"),
            Ok(Command::PlaylistNew {
                name: "Chill".into(),
                description: None,
            })
        );
        assert_eq!(Command::parse("playlist add 2"), Ok(Command::PlaylistAdd(2)));
        assert_eq!(Command::parse("playlist show 1"), Ok(Command::PlaylistShow(1)));
        assert_eq!(Command::parse("playlist remove 1"), Ok(Command::PlaylistRemove(1)));
        assert_eq!(Command::parse("playlist delete 1"), Ok(Command::PlaylistDelete(1)));
        assert!(Command::parse("playlist new | only description").is_err());
        assert!(Command::parse("playlist shuffle").is_err());
    }

    #[test]
    fn unknown_command_mentions_help() {
        let err = Command::parse("dance").unwrap_err();
        assert!(err.contains("help"));
    }
}
