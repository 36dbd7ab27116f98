//! Versioned normalization rules: which raw names feed each canonical field,
//! which raw values are dash-encoded combos, and which percentages are
//! recomputed from their components.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalFieldSpec {
    pub canonical_name: String,
    /// Raw names in precedence order; the first one present wins.
    pub aliases: Vec<String>,
    #[serde(default)]
    pub is_derived: bool,
}

/// A raw key holding "made-attempted" that is split into two raw keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboSpec {
    pub combo_key: String,
    pub made_key: String,
    pub attempted_key: String,
}

/// `percentage = numerator / denominator * 100`, applied after resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedSpec {
    pub numerator_field: String,
    pub denominator_field: String,
    pub percentage_field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationTable {
    pub version: String,
    pub fields: Vec<CanonicalFieldSpec>,
    #[serde(default)]
    pub combos: Vec<ComboSpec>,
    #[serde(default)]
    pub derived: Vec<DerivedSpec>,
}

#[derive(Debug)]
pub enum TableError {
    Io(std::io::Error, PathBuf),
    Parsing(serde_json::Error, PathBuf),
    Invalid(String),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Io(e, path) => write!(f, "could not read table {}: {e}", path.display()),
            TableError::Parsing(e, path) => {
                write!(f, "invalid table json at {}: {e}", path.display())
            }
            TableError::Invalid(msg) => write!(f, "invalid normalization table: {msg}"),
        }
    }
}

impl std::error::Error for TableError {}

impl Default for NormalizationTable {
    fn default() -> Self {
        Self::football()
    }
}

impl NormalizationTable {
    /// Read a table from JSON and validate it before use.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| TableError::Io(e, path.to_owned()))?;
        let table: Self =
            serde_json::from_str(&content).map_err(|e| TableError::Parsing(e, path.to_owned()))?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), TableError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.canonical_name.as_str()) {
                return Err(TableError::Invalid(format!(
                    "duplicate canonical field {}",
                    field.canonical_name
                )));
            }
            if field.aliases.is_empty() {
                return Err(TableError::Invalid(format!(
                    "{} has no aliases",
                    field.canonical_name
                )));
            }
        }

        for d in &self.derived {
            for name in [&d.numerator_field, &d.denominator_field, &d.percentage_field] {
                if !seen.contains(name.as_str()) {
                    return Err(TableError::Invalid(format!(
                        "derived metric {} refers to undeclared field {name}",
                        d.percentage_field
                    )));
                }
            }
        }

        for c in &self.combos {
            if c.combo_key.is_empty() || c.made_key.is_empty() || c.attempted_key.is_empty() {
                return Err(TableError::Invalid(format!("incomplete combo {:?}", c.combo_key)));
            }
        }

        Ok(())
    }

    /// The built-in American football table.
    pub fn football() -> Self {
        let derived: Vec<DerivedSpec> = FOOTBALL_DERIVED
            .iter()
            .map(|(numerator, denominator, percentage)| DerivedSpec {
                numerator_field: (*numerator).into(),
                denominator_field: (*denominator).into(),
                percentage_field: (*percentage).into(),
            })
            .collect();

        let fields = FOOTBALL_FIELDS
            .iter()
            .map(|(name, aliases)| CanonicalFieldSpec {
                canonical_name: (*name).into(),
                aliases: aliases.iter().map(|a| (*a).into()).collect(),
                is_derived: derived.iter().any(|d| d.percentage_field == *name),
            })
            .collect();

        let combos = FOOTBALL_COMBOS
            .iter()
            .map(|(combo, made, attempted)| ComboSpec {
                combo_key: (*combo).into(),
                made_key: (*made).into(),
                attempted_key: (*attempted).into(),
            })
            .collect();

        Self { version: FOOTBALL_TABLE_VERSION.into(), fields, combos, derived }
    }
}

pub const FOOTBALL_TABLE_VERSION: &str = "football-v1";

// Aliases are ordered by how specific the raw name is: explicit names from the
// stat-object endpoints first, then column-label names, then abbreviations.
// A raw name feeds at most one field; generic names like `interceptions` or
// `LNG` belong to the passing side.
const FOOTBALL_FIELDS: &[(&str, &[&str])] = &[
    // General
    ("gamesPlayed", &["gamesPlayed", "games", "GP"]),
    ("gamesStarted", &["gamesStarted", "GS"]),
    ("fumbles", &["fumbles", "FUM"]),
    ("fumblesLost", &["fumblesLost", "LST"]),
    ("fumblesTouchdowns", &["fumblesTouchdowns"]),
    // Passing
    ("passCompletions", &["completions", "passingCompletions", "CMP"]),
    ("passAttempts", &["passingAttempts", "passAttempts", "ATT"]),
    ("completionPercentage", &["completionPct", "completionPercentage", "CMP%"]),
    ("passYards", &["passingYards", "netPassingYards", "YDS"]),
    ("yardsPerPassAttempt", &["yardsPerPassAttempt", "avgGain"]),
    ("passYardsPerGame", &["passingYardsPerGame"]),
    ("passTouchdowns", &["passingTouchdowns", "TD"]),
    ("interceptionsThrown", &["interceptions", "passingInterceptions", "INT"]),
    ("passLong", &["longPassing", "LNG"]),
    ("sacksTaken", &["sacks", "timesSacked", "SACK"]),
    ("sackYardsLost", &["sackYardsLost", "SYL"]),
    ("passerRating", &["QBRating", "quarterbackRating", "passerRating", "RTG"]),
    ("adjustedQbr", &["adjQBR", "QBR"]),
    ("passFirstDowns", &["passingFirstDowns"]),
    ("pass20Plus", &["passingBigPlays"]),
    // Rushing
    ("rushAttempts", &["rushingAttempts", "CAR"]),
    ("rushYards", &["rushingYards"]),
    ("yardsPerRushAttempt", &["yardsPerRushAttempt"]),
    ("rushYardsPerGame", &["rushingYardsPerGame"]),
    ("rushTouchdowns", &["rushingTouchdowns"]),
    ("rushLong", &["longRushing"]),
    ("rushFirstDowns", &["rushingFirstDowns"]),
    ("rushFumbles", &["rushingFumbles"]),
    ("rush20Plus", &["rushingBigPlays"]),
    // Receiving
    ("receptions", &["receptions", "REC"]),
    ("receivingTargets", &["receivingTargets", "targets", "TGTS"]),
    ("catchPercentage", &["catchPct", "catchPercentage"]),
    ("receivingYards", &["receivingYards"]),
    ("yardsPerReception", &["yardsPerReception"]),
    ("receivingYardsPerGame", &["receivingYardsPerGame"]),
    ("receivingTouchdowns", &["receivingTouchdowns"]),
    ("receivingLong", &["longReception"]),
    ("receivingFirstDowns", &["receivingFirstDowns"]),
    ("receivingYardsAfterCatch", &["receivingYardsAfterCatch", "YAC"]),
    ("receivingFumbles", &["receivingFumbles"]),
    ("receiving20Plus", &["receivingBigPlays"]),
    // Defense
    ("totalTackles", &["totalTackles", "TOT"]),
    ("soloTackles", &["soloTackles", "SOLO"]),
    ("assistTackles", &["assistTackles", "AST"]),
    ("defensiveSacks", &["defensiveSacks"]),
    ("sackYards", &["sackYards"]),
    ("tacklesForLoss", &["tacklesForLoss", "TFL"]),
    ("quarterbackHits", &["QBHits", "quarterbackHits"]),
    ("passesDefended", &["passesDefended", "PD"]),
    ("defensiveInterceptions", &["defensiveInterceptions"]),
    ("interceptionYards", &["interceptionYards"]),
    ("interceptionTouchdowns", &["interceptionTouchdowns"]),
    ("forcedFumbles", &["fumblesForced", "forcedFumbles", "FF"]),
    ("fumbleRecoveries", &["fumblesRecovered", "fumbleRecoveries", "FR"]),
    ("defensiveTouchdowns", &["defensiveTouchdowns"]),
    ("safeties", &["safeties"]),
    ("stuffs", &["stuffs"]),
    // Kicking
    ("fieldGoalsMade", &["fieldGoalsMade", "FGM"]),
    ("fieldGoalAttempts", &["fieldGoalAttempts", "FGA"]),
    ("fieldGoalPercentage", &["fieldGoalPct", "fieldGoalPercentage", "FG%"]),
    ("fieldGoalLong", &["longFieldGoalMade"]),
    ("fieldGoals1To19Made", &["fieldGoalsMade1_19"]),
    ("fieldGoals1To19Attempts", &["fieldGoalAttempts1_19"]),
    ("fieldGoals20To29Made", &["fieldGoalsMade20_29"]),
    ("fieldGoals20To29Attempts", &["fieldGoalAttempts20_29"]),
    ("fieldGoals30To39Made", &["fieldGoalsMade30_39"]),
    ("fieldGoals30To39Attempts", &["fieldGoalAttempts30_39"]),
    ("fieldGoals40To49Made", &["fieldGoalsMade40_49"]),
    ("fieldGoals40To49Attempts", &["fieldGoalAttempts40_49"]),
    ("fieldGoals50PlusMade", &["fieldGoalsMade50", "fieldGoalsMade50_99"]),
    ("fieldGoals50PlusAttempts", &["fieldGoalAttempts50", "fieldGoalAttempts50_99"]),
    ("extraPointsMade", &["extraPointsMade", "XPM"]),
    ("extraPointAttempts", &["extraPointAttempts", "XPA"]),
    ("extraPointPercentage", &["extraPointPct", "XP%"]),
    ("kickingPoints", &["totalKickingPoints", "kickingPoints"]),
    // Punting
    ("punts", &["punts", "PUNTS"]),
    ("puntYards", &["puntYards"]),
    ("grossAvgPuntYards", &["grossAvgPuntYards"]),
    ("netAvgPuntYards", &["netAvgPuntYards"]),
    ("puntsInside20", &["puntsInside20", "IN20"]),
    ("puntLong", &["longPunt"]),
    ("puntTouchbacks", &["touchbacks", "TB"]),
    // Returns
    ("kickReturns", &["kickReturns"]),
    ("kickReturnYards", &["kickReturnYards"]),
    ("kickReturnTouchdowns", &["kickReturnTouchdowns"]),
    ("kickReturnLong", &["longKickReturn"]),
    ("puntReturns", &["puntReturns"]),
    ("puntReturnYards", &["puntReturnYards"]),
    ("puntReturnTouchdowns", &["puntReturnTouchdowns"]),
    ("puntReturnLong", &["longPuntReturn"]),
    ("puntReturnFairCatches", &["puntReturnFairCatches", "FC"]),
    // Scoring
    ("totalTouchdowns", &["totalTouchdowns", "touchdowns"]),
    ("totalPoints", &["totalPoints", "points"]),
    ("twoPointConversions", &["twoPointPassConvs", "twoPointRushConvs", "twoPointConversions"]),
];

const FOOTBALL_COMBOS: &[(&str, &str, &str)] = &[
    ("fieldGoalsMade-fieldGoalAttempts", "fieldGoalsMade", "fieldGoalAttempts"),
    ("extraPointsMade-extraPointAttempts", "extraPointsMade", "extraPointAttempts"),
    ("fieldGoalsMade1_19-fieldGoalAttempts1_19", "fieldGoalsMade1_19", "fieldGoalAttempts1_19"),
    ("fieldGoalsMade20_29-fieldGoalAttempts20_29", "fieldGoalsMade20_29", "fieldGoalAttempts20_29"),
    ("fieldGoalsMade30_39-fieldGoalAttempts30_39", "fieldGoalsMade30_39", "fieldGoalAttempts30_39"),
    ("fieldGoalsMade40_49-fieldGoalAttempts40_49", "fieldGoalsMade40_49", "fieldGoalAttempts40_49"),
    ("fieldGoalsMade50-fieldGoalAttempts50", "fieldGoalsMade50", "fieldGoalAttempts50"),
];

// Only these three are recomputed. Other percentages (extra points, catch
// rate on splits, etc.) keep whatever the feed reported.
const FOOTBALL_DERIVED: &[(&str, &str, &str)] = &[
    ("passCompletions", "passAttempts", "completionPercentage"),
    ("receptions", "receivingTargets", "catchPercentage"),
    ("fieldGoalsMade", "fieldGoalAttempts", "fieldGoalPercentage"),
];
