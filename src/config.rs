//! Run settings, optionally read from a TOML file.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::lexicon::StemmerKind;
use crate::metric::bleu::DEFAULT_MAX_ORDER;
use crate::metric::{BleuConfig, EffectiveLength};
use crate::syntax::parse_cache::DEFAULT_PARSE_CACHE;
use crate::text::DEFAULT_OOV_MARKER;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub max_order: usize,
    /// `closest` or `shortest`.
    pub effective_length: String,
    pub oov_marker: String,
    pub bleu_weights: Option<Vec<f64>>,
    pub basic_words: Option<PathBuf>,
    pub word_frequencies: Option<PathBuf>,
    /// Applied to basic words and looked-up tokens: `english` or `none`.
    pub stemmer: String,
    pub parse_cache: PathBuf,
    /// Log progress every this many sentence groups.
    pub progress_every: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_order: DEFAULT_MAX_ORDER,
            effective_length: "closest".to_string(),
            oov_marker: DEFAULT_OOV_MARKER.to_string(),
            bleu_weights: None,
            basic_words: None,
            word_frequencies: None,
            stemmer: "english".to_string(),
            parse_cache: PathBuf::from(DEFAULT_PARSE_CACHE),
            progress_every: 1000,
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Settings> {
        let settings: Settings =
            toml::from_str(text).map_err(|e| Error::Settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let path = path.as_ref();
        let settings = Settings::from_toml(&fs::read_to_string(path)?)?;
        info!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_order == 0 {
            return Err(Error::Settings("max_order must be positive".to_string()));
        }
        self.effective_length()?;
        self.stemmer()?;
        if let Some(weights) = &self.bleu_weights {
            if weights.len() != self.max_order {
                return Err(Error::Settings(format!(
                    "{} BLEU weights given for max order {}",
                    weights.len(),
                    self.max_order
                )));
            }
        }
        if self.progress_every == 0 {
            return Err(Error::Settings("progress_every must be positive".to_string()));
        }
        Ok(())
    }

    pub fn effective_length(&self) -> Result<EffectiveLength> {
        self.effective_length.parse().map_err(Error::Settings)
    }

    pub fn stemmer(&self) -> Result<StemmerKind> {
        self.stemmer.parse().map_err(Error::Settings)
    }

    /// A BLEU configuration with the given order and length policy and the
    /// configured weights. Weights that do not match the order are an error.
    pub fn bleu_config(&self, max_order: usize, eff: EffectiveLength) -> Result<BleuConfig> {
        let config = BleuConfig::new(max_order, eff);
        match &self.bleu_weights {
            None => Ok(config),
            Some(w) if w.len() == config.max_order => config.with_weights(w.clone()),
            Some(w) => Err(Error::Settings(format!(
                "{} BLEU weights given for max order {}",
                w.len(),
                config.max_order
            ))),
        }
    }
}
