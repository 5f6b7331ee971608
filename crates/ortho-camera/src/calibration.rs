use serde::{Deserialize, Serialize};

use crate::error::CameraError;

/// The intrinsic parameters a calibration model may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// Focal length shared by both axes.
    Focal,
    /// Focal length along X.
    FocalX,
    /// Focal length along Y.
    FocalY,
    /// Principal point X.
    Cx,
    /// Principal point Y.
    Cy,
    /// Radial distortion coefficient 1.
    K1,
    /// Radial distortion coefficient 2.
    K2,
    /// Radial distortion coefficient 3.
    K3,
    /// Radial distortion coefficient 4.
    K4,
    /// Radial distortion coefficient 5.
    K5,
    /// Radial distortion coefficient 6.
    K6,
    /// Tangential distortion coefficient 1.
    P1,
    /// Tangential distortion coefficient 2.
    P2,
}

impl Parameter {
    /// The short name of the parameter.
    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Focal => "f",
            Parameter::FocalX => "fx",
            Parameter::FocalY => "fy",
            Parameter::Cx => "cx",
            Parameter::Cy => "cy",
            Parameter::K1 => "k1",
            Parameter::K2 => "k2",
            Parameter::K3 => "k3",
            Parameter::K4 => "k4",
            Parameter::K5 => "k5",
            Parameter::K6 => "k6",
            Parameter::P1 => "p1",
            Parameter::P2 => "p2",
        }
    }
}

macro_rules! camera_models {
    ($(
        $(#[$meta:meta])*
        $variant:ident => $label:literal { $($field:ident: $param:ident),* $(,)? }
    ),* $(,)?) => {
        /// The supported calibration models.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CameraModel {
            $(
                #[doc = concat!("The \"", $label, "\" model.")]
                $variant,
            )*
        }

        impl CameraModel {
            /// Every supported model.
            pub const ALL: &'static [CameraModel] = &[$(CameraModel::$variant),*];

            /// The display name of the model.
            pub fn name(&self) -> &'static str {
                match self {
                    $(CameraModel::$variant => $label,)*
                }
            }

            /// The parameters the model holds, in storage order.
            pub fn parameters(&self) -> &'static [Parameter] {
                match self {
                    $(CameraModel::$variant => &[$(Parameter::$param),*],)*
                }
            }
        }

        /// Intrinsic calibration of a camera.
        ///
        /// Each variant carries exactly the parameters of its model. Reading
        /// a parameter the model does not hold yields zero.
        #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "model")]
        pub enum Calibration {
            $(
                #[doc = concat!("A calibration of the \"", $label, "\" model.")]
                $(#[$meta])*
                $variant {
                    $(
                        #[doc = concat!("The `", stringify!($field), "` parameter.")]
                        #[serde(default)]
                        $field: f64,
                    )*
                },
            )*
        }

        impl Calibration {
            /// A calibration of the given model with every parameter set to zero.
            pub fn new(model: CameraModel) -> Self {
                match model {
                    $(CameraModel::$variant => Calibration::$variant { $($field: 0.0),* },)*
                }
            }

            /// The model of the calibration.
            pub fn model(&self) -> CameraModel {
                match self {
                    $(Calibration::$variant { .. } => CameraModel::$variant,)*
                }
            }

            /// The active parameters and their values.
            pub fn parameters(&self) -> Vec<(Parameter, f64)> {
                match *self {
                    $(Calibration::$variant { $($field),* } => vec![$((Parameter::$param, $field)),*],)*
                }
            }

            fn slot_mut(&mut self, parameter: Parameter) -> Option<&mut f64> {
                match self {
                    $(Calibration::$variant { $($field),* } => {
                        $(
                            if parameter == Parameter::$param {
                                return Some($field);
                            }
                        )*
                        None
                    })*
                }
            }
        }
    };
}

camera_models! {
    #[serde(rename = "radial1")]
    Radial1 => "Simple radial" { f: Focal, cx: Cx, cy: Cy, k1: K1 },
    #[serde(rename = "radial2")]
    Radial2 => "Radial" { f: Focal, cx: Cx, cy: Cy, k1: K1, k2: K2 },
    #[serde(rename = "radial3")]
    Radial3 => "Full radial" { f: Focal, cx: Cx, cy: Cy, k1: K1, k2: K2, k3: K3, p1: P1, p2: P2 },
    #[serde(rename = "simple_radial_fisheye")]
    SimpleRadialFisheye => "Simple Radial Fisheye" { f: Focal, cx: Cx, cy: Cy, k1: K1 },
    #[serde(rename = "radial_fisheye")]
    RadialFisheye => "Radial Fisheye" { f: Focal, cx: Cx, cy: Cy, k1: K1, k2: K2 },
    #[serde(rename = "opencv")]
    OpenCv => "OpenCV" { fx: FocalX, fy: FocalY, cx: Cx, cy: Cy, k1: K1, k2: K2, p1: P1, p2: P2 },
    #[serde(rename = "opencv_fisheye")]
    OpenCvFisheye => "OpenCV Fisheye" { fx: FocalX, fy: FocalY, cx: Cx, cy: Cy, k1: K1, k2: K2, k3: K3, k4: K4 },
    #[serde(rename = "opencv_full")]
    OpenCvFull => "OpenCV Full" {
        fx: FocalX, fy: FocalY, cx: Cx, cy: Cy,
        k1: K1, k2: K2, k3: K3, k4: K4, k5: K5, k6: K6, p1: P1, p2: P2,
    },
    #[serde(rename = "simple_pinhole")]
    SimplePinhole => "Simple Pinhole" { f: Focal, cx: Cx, cy: Cy },
    #[serde(rename = "pinhole")]
    Pinhole => "Pinhole" { fx: FocalX, fy: FocalY, cx: Cx, cy: Cy },
}

impl CameraModel {
    /// Look a model up by its display name.
    ///
    /// # Examples
    ///
    /// ```
    /// use ortho_camera::CameraModel;
    ///
    /// assert_eq!(CameraModel::from_name("Radial").unwrap(), CameraModel::Radial2);
    /// assert!(CameraModel::from_name("Fancy").is_err());
    /// ```
    pub fn from_name(name: &str) -> Result<Self, CameraError> {
        CameraModel::ALL
            .iter()
            .copied()
            .find(|model| model.name() == name)
            .ok_or_else(|| CameraError::UnknownModel(name.to_string()))
    }
}

impl std::fmt::Display for CameraModel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Calibration {
    /// Whether the model holds the parameter.
    pub fn is_active(&self, parameter: Parameter) -> bool {
        self.model().parameters().contains(&parameter)
    }

    /// The value of a parameter, zero when the model does not hold it.
    pub fn parameter(&self, parameter: Parameter) -> f64 {
        self.parameters()
            .into_iter()
            .find(|(p, _)| *p == parameter)
            .map_or(0.0, |(_, value)| value)
    }

    /// Set a parameter.
    ///
    /// Returns `false` and leaves the calibration untouched when the model
    /// does not hold the parameter.
    pub fn set_parameter(&mut self, parameter: Parameter, value: f64) -> bool {
        match self.slot_mut(parameter) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// The focal length in pixels, the mean of `fx` and `fy` for models with
    /// one focal per axis.
    pub fn focal(&self) -> f64 {
        if self.is_active(Parameter::Focal) {
            self.parameter(Parameter::Focal)
        } else {
            0.5 * (self.parameter(Parameter::FocalX) + self.parameter(Parameter::FocalY))
        }
    }

    /// The principal point `(cx, cy)` in pixels.
    pub fn principal_point(&self) -> [f64; 2] {
        [self.parameter(Parameter::Cx), self.parameter(Parameter::Cy)]
    }
}
