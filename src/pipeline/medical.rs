//! Pattern-based medical entity extraction from parsed document text.
//!
//! Pure functions over the input text: no I/O, no LLM, no state. A text with
//! no matches yields the all-empty default; absence is never an error.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Closed vocabulary of common emergency medications. Results come back in
/// this order, not text order.
const COMMON_MEDICATIONS: &[&str] = &[
    "epinephrine",
    "atropine",
    "aspirin",
    "midazolam",
    "morphine",
    "lidocaine",
    "amiodarone",
    "adenosine",
    "naloxone",
    "dextrose",
    "albuterol",
    "nitroglycerin",
];

const PROCEDURE_KEYWORDS: &[&str] = &[
    "intubation",
    "iv access",
    "cpr",
    "defibrillation",
    "cardioversion",
    "chest compression",
    "airway management",
    "ventilation",
];

const MAX_DOSAGES: usize = 10;
const MAX_CONTRAINDICATIONS: usize = 5;
const MAX_VITAL_MATCHES: usize = 3;

static DOSAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+(?:\.\d+)?\s*(?:mg|mcg|g|ml|units?|iu)\b").unwrap());

/// Warning phrases, each consumed up to the next sentence boundary or end of
/// text. Match order follows pattern-definition order.
static CONTRAINDICATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)contraindicated?.*?(?:\.|$)").unwrap(),
        Regex::new(r"(?i)do not.*?(?:\.|$)").unwrap(),
        Regex::new(r"(?i)avoid.*?(?:\.|$)").unwrap(),
        Regex::new(r"(?i)should not.*?(?:\.|$)").unwrap(),
    ]
});

static HEART_RATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+\s*bpm").unwrap());
static BLOOD_PRESSURE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+/\d+\s*mmhg").unwrap());
static TEMPERATURE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+(?:\.\d+)?\s*°?[cf]\b").unwrap());
static OXYGEN_SAT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+%?\s*o2").unwrap());

/// Vital-sign readings found in the text. A key is present only when at
/// least one match was found; keys keep the wire names clients expect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalSigns {
    #[serde(rename = "heartRate", skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<Vec<String>>,
    #[serde(rename = "bloodPressure", skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Vec<String>>,
    #[serde(rename = "oxygenSat", skip_serializing_if = "Option::is_none")]
    pub oxygen_sat: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalEntities {
    pub dosages: Vec<String>,
    pub medications: Vec<String>,
    pub contraindications: Vec<String>,
    pub procedures: Vec<String>,
    pub vitals: VitalSigns,
}

/// Extract all entity classes from free text.
pub fn extract_medical_info(text: &str) -> MedicalEntities {
    MedicalEntities {
        dosages: extract_dosages(text),
        medications: extract_medications(text),
        contraindications: extract_contraindications(text),
        procedures: extract_procedures(text),
        vitals: extract_vital_signs(text),
    }
}

/// `<number> <unit>` matches, deduplicated first-seen, capped at 10.
/// Case is preserved as first seen in the text.
fn extract_dosages(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dosages = Vec::new();
    for m in DOSAGE_PATTERN.find_iter(text) {
        let dosage = m.as_str().to_string();
        if seen.insert(dosage.to_lowercase()) {
            dosages.push(dosage);
            if dosages.len() == MAX_DOSAGES {
                break;
            }
        }
    }
    dosages
}

fn extract_medications(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    COMMON_MEDICATIONS
        .iter()
        .filter(|med| lower.contains(*med))
        .map(|med| med.to_string())
        .collect()
}

fn extract_contraindications(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    for pattern in CONTRAINDICATION_PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            found.push(m.as_str().trim().to_string());
        }
    }
    found.truncate(MAX_CONTRAINDICATIONS);
    found
}

fn extract_procedures(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    PROCEDURE_KEYWORDS
        .iter()
        .filter(|proc| lower.contains(*proc))
        .map(|proc| proc.to_string())
        .collect()
}

fn extract_vital_signs(text: &str) -> VitalSigns {
    let capped = |pattern: &Regex| -> Option<Vec<String>> {
        let matches: Vec<String> = pattern
            .find_iter(text)
            .take(MAX_VITAL_MATCHES)
            .map(|m| m.as_str().to_string())
            .collect();
        (!matches.is_empty()).then_some(matches)
    };

    VitalSigns {
        heart_rate: capped(&HEART_RATE_PATTERN),
        blood_pressure: capped(&BLOOD_PRESSURE_PATTERN),
        temperature: capped(&TEMPERATURE_PATTERN),
        oxygen_sat: capped(&OXYGEN_SAT_PATTERN),
    }
}
