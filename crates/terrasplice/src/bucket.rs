//! FlightGear tile bucket addressing.
//!
//! The world is cut into rows 1/8 degree tall. Each row is split into
//! tiles whose width depends on latitude, so tiles stay roughly square
//! on the ground:
//!
//! ```text
//!   |lat| >= 89   360 deg (one cap tile)
//!   |lat| >= 88     8 deg
//!   |lat| >= 86     4 deg
//!   |lat| >= 83     2 deg
//!   |lat| >= 76     1 deg
//!   |lat| >= 62   1/2 deg
//!   |lat| >= 22   1/4 deg
//!   otherwise     1/8 deg
//! ```
//!
//! A bucket is named after the whole degree containing its south-west
//! corner (`lon`, `lat`) plus the column `x` and row `y` inside that
//! degree.

use std::fmt;

/// Height of every bucket row in degrees.
pub const BUCKET_SPAN: f64 = 0.125;

/// Half of [`BUCKET_SPAN`].
pub const HALF_BUCKET_SPAN: f64 = 0.5 * BUCKET_SPAN;

const EPSILON: f64 = 0.0000001;

/// Width in degrees of the buckets at latitude `lat`.
pub fn bucket_span(lat: f64) -> f64 {
    if lat >= 89.0 {
        360.0
    } else if lat >= 88.0 {
        8.0
    } else if lat >= 86.0 {
        4.0
    } else if lat >= 83.0 {
        2.0
    } else if lat >= 76.0 {
        1.0
    } else if lat >= 62.0 {
        0.5
    } else if lat >= 22.0 {
        0.25
    } else if lat >= -22.0 {
        0.125
    } else if lat >= -62.0 {
        0.25
    } else if lat >= -76.0 {
        0.5
    } else if lat >= -83.0 {
        1.0
    } else if lat >= -86.0 {
        2.0
    } else if lat >= -88.0 {
        4.0
    } else if lat >= -89.0 {
        8.0
    } else {
        360.0
    }
}

/// Whole degree at or below `value`, treating values within epsilon of an
/// integer as that integer.
fn degree_floor(value: f64) -> i32 {
    let truncated = value as i32;
    let diff = value - truncated as f64;
    if value >= 0.0 || diff.abs() < EPSILON {
        truncated
    } else {
        truncated - 1
    }
}

/// One scenery tile.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct Bucket {
    lon: i32,
    lat: i32,
    x: i32,
    y: i32,
}

impl Bucket {
    /// The bucket containing (`lon`, `lat`) in degrees.
    pub fn new(lon: f64, lat: f64) -> Self {
        let span = bucket_span(lat);
        let mut lon_deg = degree_floor(lon);

        let x = if span < EPSILON {
            lon_deg = 0;
            0
        } else if span <= 1.0 {
            ((lon - lon_deg as f64) / span) as i32
        } else {
            // wide buckets snap to a multiple of their span
            let span_i = span as i32;
            lon_deg = if lon >= 0.0 {
                (lon_deg / span_i) * span_i
            } else {
                ((lon_deg + 1) / span_i) * span_i - span_i
            };
            lon_deg = lon_deg.max(-180);
            0
        };

        let lat_deg = degree_floor(lat);
        let y = ((lat - lat_deg as f64) * 8.0) as i32;

        Self {
            lon: lon_deg,
            lat: lat_deg,
            x,
            y,
        }
    }

    /// Rebuild a bucket from its [`index`](Self::index).
    pub fn from_index(index: i64) -> Self {
        let mut rest = index;
        let lon = rest >> 14;
        rest -= lon << 14;
        let lat = rest >> 6;
        rest -= lat << 6;
        let y = rest >> 3;
        rest -= y << 3;

        Self {
            lon: (lon - 180) as i32,
            lat: (lat - 90) as i32,
            x: rest as i32,
            y: y as i32,
        }
    }

    /// Unique numeric id, also the shared-file name.
    pub fn index(&self) -> i64 {
        ((self.lon as i64 + 180) << 14)
            + ((self.lat as i64 + 90) << 6)
            + ((self.y as i64) << 3)
            + self.x as i64
    }

    pub fn lon(&self) -> i32 {
        self.lon
    }

    pub fn lat(&self) -> i32 {
        self.lat
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn center_lon(&self) -> f64 {
        let span = bucket_span(self.lat as f64 + self.y as f64 / 8.0 + HALF_BUCKET_SPAN);
        if span >= 1.0 {
            self.lon as f64 + span / 2.0
        } else {
            self.lon as f64 + self.x as f64 * span + span / 2.0
        }
    }

    pub fn center_lat(&self) -> f64 {
        self.lat as f64 + self.y as f64 / 8.0 + HALF_BUCKET_SPAN
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        bucket_span(self.center_lat())
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        BUCKET_SPAN
    }

    /// South-west corner as (lon, lat).
    pub fn min(&self) -> (f64, f64) {
        (
            self.center_lon() - self.width() / 2.0,
            self.center_lat() - self.height() / 2.0,
        )
    }

    /// North-east corner as (lon, lat).
    pub fn max(&self) -> (f64, f64) {
        (
            self.center_lon() + self.width() / 2.0,
            self.center_lat() + self.height() / 2.0,
        )
    }

    /// Relative directory of this bucket, e.g. `w130n30/w123n37`.
    pub fn base_path(&self) -> String {
        let (hem, top_lon, main_lon) = split_hemisphere(self.lon, 'e', 'w');
        let (pole, top_lat, main_lat) = split_hemisphere(self.lat, 'n', 's');
        format!("{hem}{top_lon:03}{pole}{top_lat:02}/{hem}{main_lon:03}{pole}{main_lat:02}")
    }

    /// The bucket `dx` tiles east and `dy` rows north of this one.
    ///
    /// Longitude wraps around the antimeridian; latitude is clamped just
    /// short of the poles.
    pub fn offset(&self, dx: i32, dy: i32) -> Bucket {
        let clat = (self.center_lat() + dy as f64 * BUCKET_SPAN).clamp(-89.99999, 89.99999);

        // the span at the destination row decides how far one step east is
        let span = bucket_span(clat);
        let mut lon = self.center_lon() + dx as f64 * span;
        while lon < -180.0 {
            lon += 360.0;
        }
        while lon >= 180.0 {
            lon -= 360.0;
        }

        Bucket::new(lon, clat)
    }
}

/// Ten-degree block, absolute degree and hemisphere letter of `deg`.
fn split_hemisphere(deg: i32, positive: char, negative: char) -> (char, i32, i32) {
    let mut top = deg / 10;
    if deg < 0 && top * 10 != deg {
        top -= 1;
    }
    top *= 10;
    if top >= 0 {
        (positive, top, deg.abs())
    } else {
        (negative, -top, deg.abs())
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}, {}:{}", self.lon, self.x, self.lat, self.y)
    }
}
