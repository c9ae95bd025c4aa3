//! The chapters currently loaded for practice, and refreshing them.

use std::collections::BTreeSet;

use crate::chapter::Chapter;
use crate::lines::{lines_of, Line};
use crate::scheduler::reconcile_selection;

/// Handed out when a refresh starts. Only the newest ticket applied wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// A newer refresh was already applied; the chapters were dropped.
    Stale,
}

#[derive(Debug, Clone, Default)]
pub struct Study {
    chapters: Vec<Chapter>,
    selected: BTreeSet<String>,
    issued: u64,
    applied: u64,
}

impl Study {
    /// A study with every chapter selected.
    pub fn new(chapters: Vec<Chapter>) -> Self {
        let selected = chapter_names(&chapters);
        Self {
            chapters,
            selected,
            issued: 0,
            applied: 0,
        }
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter(&self, name: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.name == name)
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    /// Select or deselect a chapter by name. Unknown names are ignored.
    pub fn set_selected(&mut self, name: &str, on: bool) -> bool {
        if self.chapter(name).is_none() {
            return false;
        }
        if on {
            self.selected.insert(name.to_string());
        } else {
            self.selected.remove(name);
        }
        true
    }

    /// Lines of every chapter, in chapter order.
    pub fn lines(&self) -> Vec<Line> {
        self.chapters.iter().flat_map(lines_of).collect()
    }

    /// Lines of the selected chapters only. Deselecting every chapter leaves
    /// nothing to practice; it never falls back to the whole study.
    pub fn selected_lines(&self) -> Vec<Line> {
        self.chapters
            .iter()
            .filter(|c| self.selected.contains(&c.name))
            .flat_map(lines_of)
            .collect()
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket(self.issued)
    }

    /// Replace the chapters with a refreshed parse, unless a refresh that
    /// started later has already been applied.
    pub fn apply_refresh(&mut self, ticket: RefreshTicket, chapters: Vec<Chapter>) -> RefreshOutcome {
        if ticket.0 <= self.applied {
            tracing::debug!(
                ticket = ticket.0,
                applied = self.applied,
                "discarding stale refresh"
            );
            return RefreshOutcome::Stale;
        }

        let old = chapter_names(&self.chapters);
        let new = chapter_names(&chapters);
        self.selected = reconcile_selection(&old, &new, &self.selected);
        self.chapters = chapters;
        self.applied = ticket.0;
        RefreshOutcome::Applied
    }
}

fn chapter_names(chapters: &[Chapter]) -> BTreeSet<String> {
    chapters.iter().map(|c| c.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pgn::parse;

    fn chapters(names: &[&str]) -> Vec<Chapter> {
        let pgn: String = names
            .iter()
            .map(|n| format!("[Event \"Rep: {}\"]\n1. e4 *\n", n))
            .collect();
        parse(&pgn).unwrap()
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_refresh_keeps_selection_by_name() {
        let mut study = Study::new(chapters(&["A", "B", "C"]));
        assert_eq!(study.selected(), &set(&["A", "B", "C"]));
        study.set_selected("B", false);
        study.set_selected("C", false);

        let ticket = study.begin_refresh();
        let outcome = study.apply_refresh(ticket, chapters(&["B", "C", "D"]));
        assert_eq!(outcome, RefreshOutcome::Applied);
        assert_eq!(study.selected(), &set(&["D"]));
        assert_eq!(study.lines().len(), 3);
    }

    #[test]
    fn test_out_of_order_refresh_is_stale() {
        let mut study = Study::new(chapters(&["A"]));
        let first = study.begin_refresh();
        let second = study.begin_refresh();

        assert_eq!(
            study.apply_refresh(second, chapters(&["New"])),
            RefreshOutcome::Applied
        );
        assert_eq!(
            study.apply_refresh(first, chapters(&["Old"])),
            RefreshOutcome::Stale
        );
        assert!(study.chapter("New").is_some());
        assert!(study.chapter("Old").is_none());
    }

    #[test]
    fn test_deselecting_everything_leaves_no_lines() {
        let mut study = Study::new(chapters(&["A", "B"]));
        assert_eq!(study.selected_lines().len(), 2);
        study.set_selected("A", false);
        assert_eq!(study.selected_lines().len(), 1);
        study.set_selected("B", false);
        assert!(study.selected().is_empty());
        assert!(study.selected_lines().is_empty());
        assert_eq!(study.lines().len(), 2);
    }

    #[test]
    fn test_unknown_chapter_selection_is_ignored() {
        let mut study = Study::new(chapters(&["A"]));
        assert!(!study.set_selected("Z", true));
        assert_eq!(study.selected(), &set(&["A"]));
    }
}
