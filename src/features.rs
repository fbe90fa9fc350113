use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shot::ShotRecord;
use crate::{Result, XgError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    Angle,
    Distance,
    X,
    C,
    X2,
    C2,
    AngleX,
    Distance2,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Feature::Angle,
        Feature::Distance,
        Feature::X,
        Feature::C,
        Feature::X2,
        Feature::C2,
        Feature::AngleX,
        Feature::Distance2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Angle => "Angle",
            Feature::Distance => "Distance",
            Feature::X => "X",
            Feature::C => "C",
            Feature::X2 => "X2",
            Feature::C2 => "C2",
            Feature::AngleX => "AX",
            Feature::Distance2 => "D2",
        }
    }

    pub fn extract(self, shot: &ShotRecord) -> f64 {
        match self {
            Feature::Angle => shot.angle,
            Feature::Distance => shot.distance,
            Feature::X => shot.x,
            Feature::C => shot.c,
            Feature::X2 => shot.x * shot.x,
            Feature::C2 => shot.c * shot.c,
            Feature::AngleX => shot.angle * shot.x,
            Feature::Distance2 => shot.distance * shot.distance,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = XgError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        let feature = match key.as_str() {
            "angle" => Feature::Angle,
            "distance" => Feature::Distance,
            "x" => Feature::X,
            "c" => Feature::C,
            "x2" => Feature::X2,
            "c2" => Feature::C2,
            "ax" | "anglex" => Feature::AngleX,
            "d2" | "distance2" => Feature::Distance2,
            _ => return Err(XgError::UnknownFeature(s.trim().to_string())),
        };
        Ok(feature)
    }
}

/// Ordered list of model inputs. Coefficient `i + 1` belongs to `features[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Feature>", into = "Vec<Feature>")]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    pub fn new(features: Vec<Feature>) -> Result<Self> {
        for (idx, f) in features.iter().enumerate() {
            if features[..idx].contains(f) {
                return Err(XgError::InvalidInput(format!(
                    "feature {f} listed more than once"
                )));
            }
        }
        Ok(Self { features })
    }

    /// Intercept-only configuration.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn angle_only() -> Self {
        Self {
            features: vec![Feature::Angle],
        }
    }

    pub fn distance_only() -> Self {
        Self {
            features: vec![Feature::Distance],
        }
    }

    pub fn distance_squared() -> Self {
        Self {
            features: vec![Feature::Distance, Feature::Distance2],
        }
    }

    pub fn full() -> Self {
        Self {
            features: vec![
                Feature::Angle,
                Feature::Distance,
                Feature::X,
                Feature::C,
                Feature::X2,
                Feature::C2,
                Feature::AngleX,
            ],
        }
    }

    /// Accepts a preset name (`full`, `angle`, `distance`, `distance2`) or a
    /// comma separated list of feature names.
    pub fn parse(spec: &str) -> Result<Self> {
        match spec.trim().to_ascii_lowercase().as_str() {
            "full" => return Ok(Self::full()),
            "angle" => return Ok(Self::angle_only()),
            "distance" => return Ok(Self::distance_only()),
            "distance2" | "distance+d2" => return Ok(Self::distance_squared()),
            "null" | "intercept" => return Ok(Self::empty()),
            _ => {}
        }
        let features = spec
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(Feature::from_str)
            .collect::<Result<Vec<_>>>()?;
        Self::new(features)
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.name().to_string()).collect()
    }
}

impl TryFrom<Vec<Feature>> for FeatureSet {
    type Error = XgError;

    fn try_from(features: Vec<Feature>) -> Result<Self> {
        Self::new(features)
    }
}

impl From<FeatureSet> for Vec<Feature> {
    fn from(set: FeatureSet) -> Self {
        set.features
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub fn build_features(shot: &ShotRecord, set: &FeatureSet) -> FeatureVector {
    FeatureVector {
        values: set.features.iter().map(|f| f.extract(shot)).collect(),
    }
}

pub fn design_rows(shots: &[ShotRecord], set: &FeatureSet) -> Vec<FeatureVector> {
    shots.iter().map(|s| build_features(s, set)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PitchFrame;

    #[test]
    fn full_set_follows_declared_order() {
        let shot = ShotRecord::at(12.0, 30.0, true, &PitchFrame::default());
        let v = build_features(&shot, &FeatureSet::full());
        assert_eq!(v.len(), 7);
        assert_eq!(v.values[0], shot.angle);
        assert_eq!(v.values[1], shot.distance);
        assert_eq!(v.values[2], 12.0);
        assert_eq!(v.values[3], 4.0);
        assert_eq!(v.values[4], 144.0);
        assert_eq!(v.values[5], 16.0);
        assert_eq!(v.values[6], shot.angle * 12.0);
    }

    #[test]
    fn parse_presets_and_lists() {
        assert_eq!(FeatureSet::parse("full").unwrap(), FeatureSet::full());
        assert_eq!(
            FeatureSet::parse("Distance, D2").unwrap(),
            FeatureSet::distance_squared()
        );
        assert!(FeatureSet::parse("null").unwrap().is_empty());
        assert!(matches!(
            FeatureSet::parse("Angle,Speed"),
            Err(XgError::UnknownFeature(name)) if name == "Speed"
        ));
    }

    #[test]
    fn duplicates_are_rejected() {
        assert!(FeatureSet::new(vec![Feature::X, Feature::C, Feature::X]).is_err());
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for f in Feature::ALL {
            assert_eq!(f.name().parse::<Feature>().unwrap(), f);
        }
    }
}
