//! Style pool for deduplication

use super::Style;
use ahash::AHashMap;

/// Deduplicated styles of one worksheet
///
/// Cells reference styles by index; index 0 is always the default style.
#[derive(Debug, Clone)]
pub struct StylePool {
    styles: Vec<Style>,
    index_map: AHashMap<Style, u32>,
}

impl StylePool {
    pub fn new() -> Self {
        let mut pool = Self {
            styles: Vec::with_capacity(32),
            index_map: AHashMap::with_capacity(32),
        };
        pool.get_or_insert(Style::default());
        pool
    }

    /// Index of an identical style, inserting it when new
    pub fn get_or_insert(&mut self, style: Style) -> u32 {
        if let Some(&idx) = self.index_map.get(&style) {
            return idx;
        }
        let idx = self.styles.len() as u32;
        self.index_map.insert(style.clone(), idx);
        self.styles.push(style);
        idx
    }

    pub fn get(&self, index: u32) -> Option<&Style> {
        self.styles.get(index as usize)
    }

    /// Style at `index`, or the default for dangling indices
    pub fn resolve(&self, index: u32) -> &Style {
        self.get(index).unwrap_or(&self.styles[0])
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Only the default style is present
    pub fn is_empty(&self) -> bool {
        self.styles.len() <= 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Style)> {
        self.styles.iter().enumerate().map(|(i, s)| (i as u32, s))
    }
}

impl Default for StylePool {
    fn default() -> Self {
        Self::new()
    }
}
