//! Output format definitions.
//!
//! An [`EncodingTarget`] names one output format and the FFmpeg options used
//! to produce it. [`EncodingTargets`] is the ordered list of targets every
//! job encodes; order is taken from the configuration as written.

use std::fmt::{Formatter, Result as FmtResult};

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

/// One output format and the encoder options that produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingTarget {
    /// Format name, also used as the output file extension (e.g. `mp4`).
    pub format: String,
    /// Option strings passed to the encoder in order (e.g. `-crf 18`).
    pub options: Vec<String>,
}

impl EncodingTarget {
    /// Create a target from a format name and option strings.
    pub fn new<I, S>(format: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            format: format.into(),
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Expand the option strings into command-line arguments.
    ///
    /// Each option is split once at its first whitespace, so `-crf 18`
    /// becomes `-crf`, `18` while `-vf scale=trunc(iw/2)*2:trunc(ih/2)*2`
    /// keeps its filter expression intact.
    pub fn arguments(&self) -> Vec<String> {
        let mut arguments = Vec::with_capacity(self.options.len() * 2);
        for option in &self.options {
            let option = option.trim();
            if option.is_empty() {
                continue;
            }
            match option.split_once(char::is_whitespace) {
                Some((flag, value)) => {
                    arguments.push(flag.to_string());
                    arguments.push(value.trim_start().to_string());
                }
                None => arguments.push(option.to_string()),
            }
        }
        arguments
    }
}

/// Ordered collection of [`EncodingTarget`]s.
///
/// Deserializes from a JSON object mapping format names to option lists,
/// keeping the order in which keys appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingTargets(Vec<EncodingTarget>);

impl EncodingTargets {
    /// An empty target list.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Append a target, replacing any existing target with the same format
    /// in place so its position is kept.
    pub fn insert(&mut self, target: EncodingTarget) {
        match self.0.iter_mut().find(|t| t.format == target.format) {
            Some(existing) => *existing = target,
            None => self.0.push(target),
        }
    }

    /// Iterate over targets in encode order.
    pub fn iter(&self) -> std::slice::Iter<'_, EncodingTarget> {
        self.0.iter()
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no targets.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Format names in encode order.
    pub fn formats(&self) -> Vec<&str> {
        self.0.iter().map(|t| t.format.as_str()).collect()
    }
}

impl Default for EncodingTargets {
    /// MP4 (H.264 baseline), OGV (Theora) and WebM (VP8), in that order.
    fn default() -> Self {
        Self(vec![
            EncodingTarget::new(
                "mp4",
                [
                    "-vcodec libx264",
                    "-pix_fmt yuv420p",
                    "-profile:v baseline",
                    "-preset slower",
                    "-crf 18",
                    "-vf scale=trunc(iw/2)*2:trunc(ih/2)*2",
                ],
            ),
            EncodingTarget::new("ogv", ["-q 5", "-pix_fmt yuv420p", "-vcodec libtheora"]),
            EncodingTarget::new(
                "webm",
                ["-c:v libvpx", "-pix_fmt yuv420p", "-quality good", "-crf 10"],
            ),
        ])
    }
}

impl FromIterator<EncodingTarget> for EncodingTargets {
    fn from_iter<T: IntoIterator<Item = EncodingTarget>>(iter: T) -> Self {
        let mut targets = Self::empty();
        for target in iter {
            targets.insert(target);
        }
        targets
    }
}

impl<'a> IntoIterator for &'a EncodingTargets {
    type Item = &'a EncodingTarget;
    type IntoIter = std::slice::Iter<'a, EncodingTarget>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

struct TargetsVisitor;

impl<'de> Visitor<'de> for TargetsVisitor {
    type Value = EncodingTargets;

    fn expecting(&self, formatter: &mut Formatter<'_>) -> FmtResult {
        formatter.write_str("a map of format names to lists of encoder options")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut targets = EncodingTargets::empty();
        while let Some((format, options)) = map.next_entry::<String, Vec<String>>()? {
            targets.insert(EncodingTarget { format, options });
        }
        Ok(targets)
    }
}

impl<'de> Deserialize<'de> for EncodingTargets {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TargetsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_in_order() {
        assert_eq!(EncodingTargets::default().formats(), vec!["mp4", "ogv", "webm"]);
    }

    #[test]
    fn arguments_split_at_first_whitespace() {
        let target = EncodingTarget::new(
            "mp4",
            ["-vcodec libx264", "-vf scale=trunc(iw/2)*2:trunc(ih/2)*2", "-shortest"],
        );
        assert_eq!(
            target.arguments(),
            vec![
                "-vcodec",
                "libx264",
                "-vf",
                "scale=trunc(iw/2)*2:trunc(ih/2)*2",
                "-shortest",
            ],
        );
    }

    #[test]
    fn deserialization_keeps_document_order() {
        let targets: EncodingTargets =
            serde_json::from_str(r#"{"webm": ["-crf 10"], "mp4": [], "ogv": ["-q 5"]}"#).unwrap();
        assert_eq!(targets.formats(), vec!["webm", "mp4", "ogv"]);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut targets = EncodingTargets::default();
        targets.insert(EncodingTarget::new("ogv", ["-q 9"]));
        assert_eq!(targets.formats(), vec!["mp4", "ogv", "webm"]);
        assert_eq!(targets.iter().nth(1).unwrap().options, vec!["-q 9"]);
    }
}
