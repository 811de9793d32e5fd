//! Export scope, cursor window, and run request validation.
//!
//! A run request is validated once into a list of [`ExportScope`] values; the
//! engine only ever sees validated scopes.

use std::str::FromStr;

use super::error::{AppError, Result};

/// Which messages a pass captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Text and media.
    All = 1,
    /// Only messages with an attachment.
    MediaOnly = 2,
    /// Only messages without an attachment.
    TextOnly = 3,
}

impl From<ExportMode> for u8 {
    fn from(mode: ExportMode) -> Self {
        mode as Self
    }
}

impl TryFrom<u8> for ExportMode {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::All),
            2 => Ok(Self::MediaOnly),
            3 => Ok(Self::TextOnly),
            _ => Err(AppError::invalid(format!(
                "Unknown export mode: {value}. Use: 1 (all), 2 (media only), 3 (text only)"
            ))),
        }
    }
}

impl std::fmt::Display for ExportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::MediaOnly => write!(f, "media only"),
            Self::TextOnly => write!(f, "text only"),
        }
    }
}

/// Immutable parameters of one pagination pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportScope {
    /// Group identifier, already normalized to its absolute value.
    pub group_id: i64,
    /// Thread to restrict to (0 = unscoped).
    pub thread_id: i64,
    pub mode: ExportMode,
    /// Inclusive lower id bound.
    pub min_id: i64,
    /// Inclusive upper event id bound (0 = unbounded).
    pub max_id: i64,
    /// Only keep deletions by this user (0 = unfiltered).
    pub filter_user_id: i64,
}

impl ExportScope {
    /// Unscoped pass over the whole group with everything captured.
    #[must_use]
    pub const fn whole_group(group_id: i64) -> Self {
        Self {
            group_id,
            thread_id: 0,
            mode: ExportMode::All,
            min_id: 0,
            max_id: 0,
            filter_user_id: 0,
        }
    }

    /// Initial cursor window for this scope.
    #[must_use]
    pub const fn window(&self) -> CursorWindow {
        CursorWindow {
            min_id: self.min_id,
            max_id: self.max_id,
        }
    }
}

/// Id bounds for the next page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorWindow {
    pub min_id: i64,
    pub max_id: i64,
}

impl CursorWindow {
    /// Moves the window below the last event of a consumed page.
    ///
    /// Returns `false` once the next window would fall below `min_id`, would
    /// reach 0 (which the source reads as "unbounded"), or would not move down.
    pub fn advance_past(&mut self, last_event_id: i64) -> bool {
        let Some(next) = last_event_id.checked_sub(1) else {
            return false;
        };
        if next < self.min_id || next <= 0 || (self.max_id > 0 && next >= self.max_id) {
            return false;
        }
        self.max_id = next;
        true
    }
}

/// Which threads a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSelector(Vec<i64>);

impl ThreadSelector {
    /// One unscoped pass over the whole group.
    #[must_use]
    pub fn unscoped() -> Self {
        Self(vec![0])
    }

    /// Thread ids in run order (0 = unscoped pass).
    #[must_use]
    pub fn ids(&self) -> &[i64] {
        &self.0
    }
}

impl FromStr for ThreadSelector {
    type Err = AppError;

    /// Accepts `0`, a single id, or a bracketed list such as `[1, 2, 3]`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let body = match s.strip_prefix('[') {
            Some(rest) => rest
                .strip_suffix(']')
                .ok_or_else(|| AppError::invalid(format!("Unterminated thread list: {s}")))?,
            None => s,
        };

        let mut ids = Vec::new();
        for part in body.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let id: i64 = part
                .parse()
                .map_err(|_| AppError::invalid(format!("Invalid thread id: {part}")))?;
            if id < 0 {
                return Err(AppError::invalid(format!("Thread id must not be negative: {id}")));
            }
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        if ids.is_empty() {
            return Err(AppError::invalid("Thread selector is empty"));
        }

        Ok(Self(ids))
    }
}

/// Raw run configuration as collected from the command line.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub group_id: i64,
    pub mode: u8,
    pub min_id: i64,
    pub max_id: i64,
    pub filter_user_id: i64,
    pub threads: ThreadSelector,
}

impl ExportRequest {
    /// Validates the request into one scope per selected thread.
    ///
    /// # Errors
    /// Returns `InvalidData` for a zero group, unknown mode, negative bounds,
    /// `min_id > max_id` with a bounded `max_id`, or a negative user filter.
    pub fn into_scopes(self) -> Result<Vec<ExportScope>> {
        if self.group_id == 0 {
            return Err(AppError::invalid("Group id must not be 0"));
        }
        let mode = ExportMode::try_from(self.mode)?;

        if self.min_id < 0 || self.max_id < 0 {
            return Err(AppError::invalid("Message id bounds must not be negative"));
        }
        if self.max_id > 0 && self.min_id > self.max_id {
            return Err(AppError::invalid(format!(
                "Minimum id {} is above maximum id {}",
                self.min_id, self.max_id
            )));
        }
        if self.filter_user_id < 0 {
            return Err(AppError::invalid("User filter must not be negative"));
        }

        let group_id = self
            .group_id
            .checked_abs()
            .ok_or_else(|| {
                AppError::invalid(format!("Group id {} is out of range", self.group_id))
            })?;
        Ok(self
            .threads
            .ids()
            .iter()
            .map(|&thread_id| ExportScope {
                group_id,
                thread_id,
                mode,
                min_id: self.min_id,
                max_id: self.max_id,
                filter_user_id: self.filter_user_id,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(threads: &str) -> ExportRequest {
        ExportRequest {
            group_id: -1_002_074_491_972,
            mode: 1,
            min_id: 0,
            max_id: 0,
            filter_user_id: 0,
            threads: threads.parse().unwrap(),
        }
    }

    #[test]
    fn test_mode_from_number() {
        assert_eq!(ExportMode::try_from(2).unwrap(), ExportMode::MediaOnly);
        assert!(ExportMode::try_from(4).is_err());
        assert_eq!(u8::from(ExportMode::TextOnly), 3);
    }

    #[test]
    fn test_thread_selector_forms() {
        assert_eq!("0".parse::<ThreadSelector>().unwrap().ids(), &[0]);
        assert_eq!("42".parse::<ThreadSelector>().unwrap().ids(), &[42]);
        assert_eq!(
            "[1, 2, 2, 3]".parse::<ThreadSelector>().unwrap().ids(),
            &[1, 2, 3]
        );
        assert!("[]".parse::<ThreadSelector>().is_err());
        assert!("[1, 2".parse::<ThreadSelector>().is_err());
        assert!("-5".parse::<ThreadSelector>().is_err());
        assert!("abc".parse::<ThreadSelector>().is_err());
    }

    #[test]
    fn test_scopes_normalize_group_sign() {
        let scopes = request("[7, 9]").into_scopes().unwrap();
        assert_eq!(scopes.len(), 2);
        assert!(scopes.iter().all(|s| s.group_id == 1_002_074_491_972));
        assert_eq!(scopes[1].thread_id, 9);
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let mut req = request("0");
        req.min_id = 50;
        req.max_id = 10;
        assert!(req.into_scopes().is_err());

        let mut req = request("0");
        req.min_id = 50;
        req.max_id = 0;
        assert!(req.into_scopes().is_ok());
    }

    #[test]
    fn test_rejects_zero_group_and_bad_mode() {
        let mut req = request("0");
        req.group_id = 0;
        assert!(req.into_scopes().is_err());

        let mut req = request("0");
        req.mode = 9;
        assert!(req.into_scopes().is_err());
    }

    #[test]
    fn test_rejects_unrepresentable_group() {
        let mut req = request("0");
        req.group_id = i64::MIN;
        assert!(matches!(req.into_scopes(), Err(AppError::InvalidData { .. })));

        let mut req = request("0");
        req.group_id = i64::MIN + 1;
        assert_eq!(req.into_scopes().unwrap()[0].group_id, i64::MAX);
    }

    #[test]
    fn test_window_advance() {
        let mut window = CursorWindow { min_id: 10, max_id: 0 };
        assert!(window.advance_past(50));
        assert_eq!(window.max_id, 49);
        assert!(window.advance_past(11));
        assert_eq!(window.max_id, 10);
        assert!(!window.advance_past(10));

        let mut stuck = CursorWindow { min_id: 0, max_id: 20 };
        assert!(!stuck.advance_past(30));
        assert_eq!(stuck.max_id, 20);

        let mut unbounded = CursorWindow { min_id: 0, max_id: 0 };
        assert!(!unbounded.advance_past(1));
        assert_eq!(unbounded.max_id, 0);

        let mut floor = CursorWindow { min_id: i64::MIN, max_id: 0 };
        assert!(!floor.advance_past(i64::MIN));
        assert_eq!(floor.max_id, 0);
    }
}
