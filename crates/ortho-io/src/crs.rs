use std::str::FromStr;

/// A coordinate reference system, carried as an identifier such as `EPSG:25830`.
///
/// No reprojection is ever performed; the identifier is only stored in the
/// outputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Crs(String);

impl Crs {
    /// Create a CRS from an identifier.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Create a CRS from an EPSG code.
    ///
    /// # Examples
    ///
    /// ```
    /// use ortho_io::Crs;
    ///
    /// let crs = Crs::from_epsg(25830);
    /// assert_eq!(crs.code(), "EPSG:25830");
    /// assert_eq!(crs.epsg_code(), Some(25830));
    /// ```
    pub fn from_epsg(code: u16) -> Self {
        Self(format!("EPSG:{code}"))
    }

    /// The identifier.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// The EPSG code, if the identifier has the form `EPSG:<code>`.
    pub fn epsg_code(&self) -> Option<u16> {
        let (authority, code) = self.0.split_once(':')?;
        if !authority.trim().eq_ignore_ascii_case("epsg") {
            return None;
        }
        code.trim().parse().ok()
    }

    /// Whether the EPSG code falls in the geographic 2D range.
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg_code(), Some(4000..=4999))
    }

    /// The OGC URN used by GeoJSON, `urn:ogc:def:crs:EPSG::<code>`.
    pub fn ogc_urn(&self) -> Option<String> {
        self.epsg_code()
            .map(|code| format!("urn:ogc:def:crs:EPSG::{code}"))
    }

    /// Parse an OGC URN or a plain identifier.
    pub fn from_ogc_urn(urn: &str) -> Self {
        match urn.rsplit_once("EPSG::") {
            Some((_, code)) => Self(format!("EPSG:{code}")),
            None => Self(urn.to_string()),
        }
    }
}

impl FromStr for Crs {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.trim()))
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsg_codes() {
        assert_eq!(Crs::new("EPSG:25830").epsg_code(), Some(25830));
        assert_eq!(Crs::new("epsg: 4326").epsg_code(), Some(4326));
        assert!(Crs::new("EPSG:4258").is_geographic());
        assert!(!Crs::new("EPSG:25830").is_geographic());
        assert_eq!(Crs::new("+proj=utm").epsg_code(), None);
        assert_eq!(Crs::new("EPSG:99999999").epsg_code(), None);
    }

    #[test]
    fn ogc_urn_roundtrip() {
        let crs = Crs::from_epsg(25830);
        let urn = crs.ogc_urn();
        assert_eq!(urn.as_deref(), Some("urn:ogc:def:crs:EPSG::25830"));
        assert_eq!(Crs::from_ogc_urn("urn:ogc:def:crs:EPSG::25830"), crs);
    }
}
