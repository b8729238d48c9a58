// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Scenario selection: which generator pipeline a run publishes with.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codec::Tag;
use crate::config::Config;
use crate::error::{HardValidationError, ProbeError, ProbeResult};
use crate::generator::{BaseBytes, BaseStruct, Encrypted, Framed, Generator};

/// Message pipelines a producer can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scenario {
    /// JSON roster, plaintext.
    #[serde(rename = "json")]
    Json,

    /// JSON roster, AES-256-GCM sealed.
    #[serde(rename = "json.encrypted")]
    JsonEncrypted,

    /// `num_bytes` zero bytes per message.
    #[default]
    #[serde(rename = "emptybytes")]
    EmptyBytes,

    /// File contents per message.
    #[serde(rename = "file")]
    File,

    /// File contents per message, AES-256-GCM sealed.
    #[serde(rename = "file.encrypted")]
    FileEncrypted,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::Json,
        Scenario::JsonEncrypted,
        Scenario::EmptyBytes,
        Scenario::File,
        Scenario::FileEncrypted,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Json => "json",
            Scenario::JsonEncrypted => "json.encrypted",
            Scenario::EmptyBytes => "emptybytes",
            Scenario::File => "file",
            Scenario::FileEncrypted => "file.encrypted",
        }
    }

    /// Whether the scenario reads its payload from `filename`.
    pub fn needs_file(&self) -> bool {
        matches!(self, Scenario::File | Scenario::FileEncrypted)
    }

    /// Build the generator for `config.scenario`.
    ///
    /// File scenarios read the file once, here.
    pub fn build_generator(config: &Config) -> ProbeResult<Arc<dyn Generator>> {
        let key = config.encryption_key.as_bytes();

        let generator: Arc<dyn Generator> = match config.scenario {
            Scenario::Json => Arc::new(Framed::new(
                Tag::JSON,
                Tag::BYTE,
                BaseStruct::new(SampleRoster::sample()),
            )),
            Scenario::JsonEncrypted => Arc::new(Framed::new(
                Tag::JSON,
                Tag::ENCR,
                Encrypted::new(BaseStruct::new(SampleRoster::sample()), key)?,
            )),
            Scenario::EmptyBytes => Arc::new(Framed::new(
                Tag::BYTE,
                Tag::BYTE,
                BaseBytes::new(vec![0u8; config.num_bytes]),
            )),
            Scenario::File => Arc::new(Framed::new(
                Tag::BYTE,
                Tag::BYTE,
                BaseBytes::new(read_payload_file(config)?),
            )),
            Scenario::FileEncrypted => Arc::new(Framed::new(
                Tag::BYTE,
                Tag::ENCR,
                Encrypted::new(BaseBytes::new(read_payload_file(config)?), key)?,
            )),
        };

        tracing::debug!(scenario = %config.scenario, "Generator ready");
        Ok(generator)
    }
}

fn read_payload_file(config: &Config) -> ProbeResult<Vec<u8>> {
    let path: &Path = config.filename.as_deref().ok_or(
        HardValidationError::MissingRequiredField {
            field: "filename",
            context: format!("scenario {}", config.scenario),
        },
    )?;

    let data = std::fs::read(path).map_err(|source| ProbeError::Io {
        context: "reading payload file",
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "Payload file loaded");
    Ok(data)
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = HardValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| HardValidationError::InvalidFieldValue {
                field: "scenario",
                value: s.to_string(),
                reason: "Must be one of json, json.encrypted, emptybytes, file, file.encrypted"
                    .to_string(),
            })
    }
}

/// Fixed nested document used by the JSON scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SampleRoster {
    pub name: String,
    pub pets: Vec<Pet>,
    pub last_golf_scores: Vec<i32>,
    pub points: f64,
    pub games: Vec<Game>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Pet {
    pub bites: bool,
    pub can_fly: bool,
    pub ignores: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Game {
    pub against: String,
    pub fun: bool,
    pub minutes_played: f64,
}

impl SampleRoster {
    pub fn sample() -> Self {
        let pet = |bites, can_fly, ignores: &str| Pet {
            bites,
            can_fly,
            ignores: ignores.to_string(),
        };
        let game = |against: &str, fun, minutes_played| Game {
            against: against.to_string(),
            fun,
            minutes_played,
        };

        Self {
            name: "Steve Rogers".to_string(),
            pets: vec![
                pet(true, true, "Polly"),
                pet(false, false, "Nothing"),
                pet(true, false, "Cat/MrCat/*"),
                pet(false, false, "Turtle"),
                pet(false, true, "Parrot2"),
                pet(true, false, "Leave my backyard!"),
            ],
            last_golf_scores: vec![83, 87, 89, 104, 90, 113, 104, 88, 88, 98, 79, 97, 120, 110],
            points: 345.32,
            games: vec![
                game("Stoke", false, 30.2),
                game("Flyfield", false, 60.4),
                game("Figgerish", false, 73.4),
                game("Tomland", true, 30.4),
                game("Huddersfield", true, 33.12),
                game("Fulham", true, 13.112),
                game("Brentford", false, 94.0),
                game("Magneto", false, 1000.4),
                game("Mom", true, 90.4),
                game("Sis", true, 45.2),
                game("Pop", true, 89.2),
                game("Brother", false, 10.4),
            ],
        }
    }
}
