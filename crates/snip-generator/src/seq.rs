use crate::Generator;
use snip_core::{CoreError, ShortCode};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A generator that replays a fixed script of codes.
///
/// Codes are handed out in order and the script wraps around once it is
/// exhausted. This makes collision handling reproducible: a script such as
/// `["AAAAA", "AAAAA", "BBBBB"]` forces a caller through two conflicts.
#[derive(Debug)]
pub struct SeqGenerator {
    cursor: AtomicUsize,
    codes: Vec<ShortCode>,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            cursor: AtomicUsize::new(self.cursor.load(Ordering::SeqCst)),
            codes: self.codes.clone(),
        }
    }
}

impl SeqGenerator {
    /// Creates a generator from a non-empty list of valid short codes.
    pub fn from_codes<I, S>(codes: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes = codes
            .into_iter()
            .map(ShortCode::new)
            .collect::<Result<Vec<_>, _>>()?;

        if codes.is_empty() {
            return Err(CoreError::InvalidGeneratorConfig(
                "sequence generator needs at least one code".to_string(),
            ));
        }

        Ok(Self {
            cursor: AtomicUsize::new(0),
            codes,
        })
    }

    /// Number of codes handed out so far.
    pub fn issued(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

impl Generator for SeqGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.codes[index % self.codes.len()].clone()
    }
}
