// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::payload::FormattedLine;

/// Accumulates formatted lines until the configured threshold is reached.
#[derive(Debug)]
pub struct Batcher {
    lines: Vec<FormattedLine>,
    threshold: usize,
}

impl Batcher {
    /// A threshold of 0 is treated as 1.
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Batcher {
            lines: Vec::with_capacity(threshold),
            threshold,
        }
    }

    /// Appends `line`, returning the completed batch once the threshold is hit.
    ///
    /// The returned batch is detached: the batcher starts a new one immediately.
    pub fn append(&mut self, line: FormattedLine) -> Option<Vec<FormattedLine>> {
        self.lines.push(line);
        if self.lines.len() >= self.threshold {
            return Some(self.take());
        }
        None
    }

    /// Takes whatever is pending, if anything.
    pub fn drain_pending(&mut self) -> Option<Vec<FormattedLine>> {
        if self.lines.is_empty() {
            return None;
        }
        Some(self.take())
    }

    fn take(&mut self) -> Vec<FormattedLine> {
        std::mem::replace(&mut self.lines, Vec::with_capacity(self.threshold))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(text: &str) -> FormattedLine {
        FormattedLine {
            timestamp: 1_700_000_000,
            text: text.to_string(),
            source_file: String::new(),
        }
    }

    #[test]
    fn test_flushes_exactly_at_threshold() {
        let mut batcher = Batcher::new(3);
        assert!(batcher.append(line("a")).is_none());
        assert!(batcher.append(line("b")).is_none());

        let batch = batcher.append(line("c")).expect("third line completes the batch");
        let texts: Vec<&str> = batch.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert!(batcher.is_empty());
    }

    #[test]
    fn test_threshold_of_one_flushes_every_line() {
        let mut batcher = Batcher::new(1);
        for text in ["x", "y", "z"] {
            let batch = batcher.append(line(text)).unwrap();
            assert_eq!(batch, vec![line(text)]);
        }
    }

    #[test]
    fn test_zero_threshold_is_clamped() {
        let batcher = Batcher::new(0);
        assert_eq!(batcher.threshold(), 1);
    }

    #[test]
    fn test_drain_pending() {
        let mut batcher = Batcher::new(5);
        assert!(batcher.drain_pending().is_none());

        batcher.append(line("a"));
        batcher.append(line("b"));
        assert_eq!(batcher.len(), 2);

        let pending = batcher.drain_pending().unwrap();
        assert_eq!(pending, vec![line("a"), line("b")]);
        assert!(batcher.is_empty());
        assert!(batcher.drain_pending().is_none());
    }

    #[test]
    fn test_batcher_is_reusable_after_flush() {
        let mut batcher = Batcher::new(2);
        batcher.append(line("1"));
        assert!(batcher.append(line("2")).is_some());
        batcher.append(line("3"));
        let second = batcher.append(line("4")).unwrap();
        assert_eq!(second, vec![line("3"), line("4")]);
    }

    proptest! {
        #[test]
        fn prop_batches_preserve_order_and_size(
            threshold in 1usize..20,
            texts in proptest::collection::vec("[a-z]{0,8}", 0..100),
        ) {
            let mut batcher = Batcher::new(threshold);
            let mut shipped = Vec::new();
            for text in &texts {
                if let Some(batch) = batcher.append(line(text)) {
                    prop_assert_eq!(batch.len(), threshold);
                    shipped.extend(batch);
                }
                prop_assert!(batcher.len() < threshold);
            }
            prop_assert_eq!(shipped.len(), texts.len() / threshold * threshold);
            shipped.extend(batcher.drain_pending().unwrap_or_default());

            let rendered: Vec<String> = shipped.into_iter().map(|l| l.text).collect();
            prop_assert_eq!(rendered, texts);
        }
    }
}
