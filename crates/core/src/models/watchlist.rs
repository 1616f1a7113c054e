use std::collections::HashSet;

use crate::errors::CoreError;
use super::rate::{CurrencyCode, PairKey, RateSample};

/// Client-only watchlist state: which pairs are hidden, which one is
/// selected, and whether hidden pairs are listed anyway.
///
/// Lives for the session only. The three fields are independent flags;
/// there is no other state to reconstruct.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchlistState {
    hidden_pairs: HashSet<PairKey>,
    selected_pair: Option<PairKey>,
    show_hidden: bool,
}

impl WatchlistState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a pair for the history chart. Hidden pairs stay hidden.
    pub fn select_pair(&mut self, pair: PairKey) {
        self.selected_pair = Some(pair);
    }

    pub fn clear_selection(&mut self) {
        self.selected_pair = None;
    }

    /// Select the first row when nothing is selected yet.
    /// Returns the newly selected pair, if any.
    pub fn select_first_if_none(&mut self, rates: &[RateSample]) -> Option<&PairKey> {
        if self.selected_pair.is_none() {
            let first = rates.first()?;
            self.selected_pair = Some(first.pair_key());
            return self.selected_pair.as_ref();
        }
        None
    }

    #[must_use]
    pub fn selected_pair(&self) -> Option<&PairKey> {
        self.selected_pair.as_ref()
    }

    #[must_use]
    pub fn is_selected(&self, pair: &PairKey) -> bool {
        self.selected_pair.as_ref() == Some(pair)
    }

    /// Flip hidden membership of `pair`. Returns whether it is now hidden.
    pub fn toggle_hidden(&mut self, pair: PairKey) -> bool {
        if self.hidden_pairs.remove(&pair) {
            false
        } else {
            self.hidden_pairs.insert(pair);
            true
        }
    }

    #[must_use]
    pub fn is_hidden(&self, pair: &PairKey) -> bool {
        self.hidden_pairs.contains(pair)
    }

    #[must_use]
    pub fn hidden_count(&self) -> usize {
        self.hidden_pairs.len()
    }

    pub fn set_show_hidden(&mut self, show: bool) {
        self.show_hidden = show;
    }

    #[must_use]
    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    /// Rows to list, in server order: everything when `show_hidden` is on,
    /// otherwise only the pairs that are not hidden.
    pub fn visible_list<'a>(&self, all_rates: &'a [RateSample]) -> Vec<&'a RateSample> {
        all_rates
            .iter()
            .filter(|r| self.show_hidden || !self.hidden_pairs.contains(&r.pair_key()))
            .collect()
    }

    /// Drop every trace of a pair that no longer exists on the backend.
    pub fn forget_pair(&mut self, pair: &PairKey) {
        self.hidden_pairs.remove(pair);
        if self.is_selected(pair) {
            self.selected_pair = None;
        }
    }
}

/// The "add pair" form.
///
/// Input is forced to uppercase and cut to 3 characters as it is typed.
/// The form can be submitted only when both fields hold exactly 3 characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairForm {
    base: String,
    target: String,
    open: bool,
}

impl PairForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_base(&mut self, raw: &str) {
        self.base = CurrencyCode::normalize_input(raw);
    }

    pub fn set_target(&mut self, raw: &str) {
        self.target = CurrencyCode::normalize_input(raw);
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Show or hide the form panel. Returns the new visibility.
    pub fn toggle_open(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn is_submittable(&self) -> bool {
        self.base.chars().count() == CurrencyCode::LEN
            && self.target.chars().count() == CurrencyCode::LEN
    }

    /// Validate the form contents into a pair key without clearing it.
    pub fn pair(&self) -> Result<PairKey, CoreError> {
        if !self.is_submittable() {
            return Err(CoreError::Validation(format!(
                "Both currency codes must have exactly {} characters (got '{}' / '{}')",
                CurrencyCode::LEN,
                self.base,
                self.target
            )));
        }
        PairKey::parse(&self.base, &self.target)
    }

    /// Reset the fields and close the panel.
    pub fn clear(&mut self) {
        self.base.clear();
        self.target.clear();
        self.open = false;
    }
}
