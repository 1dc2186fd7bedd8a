//! Matchup token parsing
//!
//! Box-score exports encode the participants of a game in free text:
//! `"LAL vs. BOS"` for a home game and `"LAL @ BOS"` for an away game.

/// Parsed matchup from the listed team's perspective
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matchup {
    Home { team: String, opponent: String },
    Away { team: String, opponent: String },
    /// Too few tokens, an unknown separator, or no text at all
    Unparseable,
}

impl Matchup {
    /// Parse a matchup cell
    ///
    /// Token 0 is the team, token 1 the separator (`vs`/`vs.` means home,
    /// a literal `@` means away) and token 2 the opponent. Abbreviations are
    /// upper-cased so they can be used as join keys.
    pub fn parse(text: Option<&str>) -> Self {
        let Some(text) = text else {
            return Matchup::Unparseable;
        };

        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() < 3 {
            return Matchup::Unparseable;
        }

        let team = tokens[0].to_uppercase();
        let opponent = tokens[2].to_uppercase();

        if tokens[1].to_lowercase().contains("vs") {
            Matchup::Home { team, opponent }
        } else if tokens[1] == "@" {
            Matchup::Away { team, opponent }
        } else {
            Matchup::Unparseable
        }
    }

    pub fn team(&self) -> Option<&str> {
        match self {
            Matchup::Home { team, .. } | Matchup::Away { team, .. } => Some(team),
            Matchup::Unparseable => None,
        }
    }

    pub fn opponent(&self) -> Option<&str> {
        match self {
            Matchup::Home { opponent, .. } | Matchup::Away { opponent, .. } => Some(opponent),
            Matchup::Unparseable => None,
        }
    }

    pub fn is_home(&self) -> Option<bool> {
        match self {
            Matchup::Home { .. } => Some(true),
            Matchup::Away { .. } => Some(false),
            Matchup::Unparseable => None,
        }
    }

    /// Flatten into `(team, opponent, is_home)`
    pub fn parts(&self) -> (Option<&str>, Option<&str>, Option<bool>) {
        (self.team(), self.opponent(), self.is_home())
    }
}
