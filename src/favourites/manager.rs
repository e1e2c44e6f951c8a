use super::Favourite;
use crate::prefs::SortMode;
use anyhow::Result;
use icu_collator::{Collator, CollatorOptions, Strength};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::PathBuf;

/// Persistence seam for the favourites list. The list is always written as one value.
pub trait FavouritesStore {
    fn load_favourites(&self) -> Vec<Favourite>;
    fn save_favourites(&mut self, favourites: &[Favourite]) -> Result<()>;
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AddOutcome {
    pub added: Vec<Favourite>,
    pub rejected: Vec<PathBuf>,
}

impl AddOutcome {
    pub fn rejected_names(&self) -> Vec<String> {
        self.rejected
            .iter()
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| p.to_string_lossy().into_owned())
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplaceOutcome {
    Replaced { previous: Favourite },
    OutOfRange,
    Duplicate,
}

pub struct FavouritesManager<S> {
    store: S,
    favourites: Vec<Favourite>,
}

impl<S: FavouritesStore> FavouritesManager<S> {
    pub fn new(store: S) -> Self {
        let favourites = store.load_favourites();
        log::debug!("Loaded {} favourites", favourites.len());
        Self { store, favourites }
    }

    pub fn favourites(&self) -> &[Favourite] {
        &self.favourites
    }

    pub fn get(&self, index: usize) -> Option<&Favourite> {
        self.favourites.get(index)
    }

    pub fn len(&self) -> usize {
        self.favourites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favourites.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Splits a batch into new entries and duplicates without writing anything. Paths already
    /// in the list, or repeated earlier in the same batch, come back in `rejected`.
    pub fn partition<I, P>(&self, paths: I) -> AddOutcome
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut seen: HashSet<PathBuf> = self.favourites.iter().map(|f| f.path.clone()).collect();
        let mut outcome = AddOutcome::default();

        for path in paths {
            let path = path.into();
            if !seen.insert(path.clone()) {
                outcome.rejected.push(path);
                continue;
            }
            outcome.added.push(Favourite::from_path(path));
        }
        outcome
    }

    /// Appends every path not already present, as split by [`Self::partition`].
    pub fn add<I, P>(&mut self, paths: I) -> Result<AddOutcome>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let outcome = self.partition(paths);
        if outcome.added.is_empty() {
            return Ok(outcome);
        }

        let mut next = self.favourites.clone();
        next.extend(outcome.added.iter().cloned());
        self.commit(next)?;

        log::info!("Added {} favourite(s), rejected {}", outcome.added.len(), outcome.rejected.len());
        Ok(outcome)
    }

    /// Out-of-range indices are ignored; the UI may hold a stale index.
    pub fn remove(&mut self, index: usize) -> Result<Option<Favourite>> {
        if index >= self.favourites.len() {
            log::debug!("Ignoring remove for stale index {}", index);
            return Ok(None);
        }

        let mut next = self.favourites.clone();
        let removed = next.remove(index);
        self.commit(next)?;

        log::info!("Removed favourite: {}", removed.path.display());
        Ok(Some(removed))
    }

    pub fn replace(&mut self, index: usize, path: impl Into<PathBuf>) -> Result<ReplaceOutcome> {
        let path = path.into();
        if index >= self.favourites.len() {
            return Ok(ReplaceOutcome::OutOfRange);
        }

        let clashes = self
            .favourites
            .iter()
            .enumerate()
            .any(|(i, f)| i != index && f.path == path);
        if clashes {
            return Ok(ReplaceOutcome::Duplicate);
        }

        let mut next = self.favourites.clone();
        let previous = std::mem::replace(&mut next[index], Favourite::from_path(path));
        self.commit(next)?;

        log::info!(
            "Replaced favourite {} with {}",
            previous.path.display(),
            self.favourites[index].path.display()
        );
        Ok(ReplaceOutcome::Replaced { previous })
    }

    /// Returns `false` without touching the store when there is nothing to clear.
    pub fn clear(&mut self) -> Result<bool> {
        if self.favourites.is_empty() {
            return Ok(false);
        }

        self.commit(Vec::new())?;
        log::info!("Cleared all favourites");
        Ok(true)
    }

    /// Display view paired with each entry's stored index. Never written back.
    pub fn sorted(&self, mode: SortMode) -> Vec<(usize, &Favourite)> {
        let mut view: Vec<(usize, &Favourite)> = self.favourites.iter().enumerate().collect();

        match mode {
            SortMode::Manual => {}
            SortMode::Type => view.sort_by_key(|(_, f)| f.kind),
            SortMode::Name => {
                let collator = name_collator();
                view.sort_by(|(_, a), (_, b)| compare_names(collator.as_ref(), &a.name, &b.name));
            }
        }

        view
    }

    fn commit(&mut self, next: Vec<Favourite>) -> Result<()> {
        self.store.save_favourites(&next)?;
        self.favourites = next;
        Ok(())
    }
}

/// Root-locale collation at secondary strength: accents count, case does not.
fn name_collator() -> Option<Collator> {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Secondary);
    match Collator::try_new(&Default::default(), options) {
        Ok(collator) => Some(collator),
        Err(e) => {
            log::warn!("Name collation unavailable, sorting by lowercase: {}", e);
            None
        }
    }
}

/// Names equal under collation fall back to code points reversed, so lowercase comes first.
fn compare_names(collator: Option<&Collator>, a: &str, b: &str) -> Ordering {
    let primary = match collator {
        Some(collator) => collator.compare(a, b),
        None => a.to_lowercase().cmp(&b.to_lowercase()),
    };
    primary.then_with(|| b.cmp(a))
}
