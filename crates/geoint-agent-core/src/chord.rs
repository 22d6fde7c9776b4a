use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail};

/// A keyboard shortcut such as `ctrl+k`. `cmd` and `meta` are read as `ctrl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub key: char,
}

impl KeyChord {
    pub fn matches(&self, ctrl: bool, alt: bool, shift: bool, key: char) -> bool {
        self.ctrl == ctrl
            && self.alt == alt
            && self.shift == shift
            && self.key.eq_ignore_ascii_case(&key)
    }
}

impl FromStr for KeyChord {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let mut chord = KeyChord {
            ctrl: false,
            alt: false,
            shift: false,
            key: ' ',
        };
        let mut key = None;

        for part in s.split('+').map(|p| p.trim().to_lowercase()) {
            match part.as_str() {
                "ctrl" | "control" | "cmd" | "meta" | "super" => chord.ctrl = true,
                "alt" | "option" => chord.alt = true,
                "shift" => chord.shift = true,
                other => {
                    let mut chars = other.chars();
                    match (chars.next(), chars.next(), key) {
                        (Some(c), None, None) => key = Some(c),
                        (_, _, Some(_)) => bail!("chord `{}` names more than one key", s),
                        _ => bail!("unknown chord component `{}` in `{}`", other, s),
                    }
                }
            }
        }

        chord.key = key.ok_or_else(|| anyhow!("chord `{}` has no key", s))?;
        if !(chord.ctrl || chord.alt) {
            bail!("chord `{}` needs ctrl or alt so it does not swallow typing", s);
        }
        Ok(chord)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        write!(f, "{}", self.key.to_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_chord() {
        let chord: KeyChord = "ctrl+k".parse().unwrap();
        assert!(chord.matches(true, false, false, 'k'));
        assert!(chord.matches(true, false, false, 'K'));
        assert!(!chord.matches(false, false, false, 'k'));
        assert_eq!(chord.to_string(), "Ctrl+K");
    }

    #[test]
    fn test_cmd_is_ctrl() {
        assert_eq!("Cmd+K".parse::<KeyChord>().unwrap(), "ctrl+k".parse().unwrap());
    }

    #[test]
    fn test_rejects_bad_chords() {
        assert!("k".parse::<KeyChord>().is_err());
        assert!("ctrl".parse::<KeyChord>().is_err());
        assert!("ctrl+k+j".parse::<KeyChord>().is_err());
        assert!("ctrl+enter".parse::<KeyChord>().is_err());
        assert!("shift+a".parse::<KeyChord>().is_err());
    }
}
