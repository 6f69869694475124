//! Proximity check for location-based check-ins.

use db::device_info::GeoPoint;
use db::models::course::Model as Course;
use sea_orm::{DatabaseConnection, DbErr};

/// Mean Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance between two points, in metres.
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

pub fn is_valid_coordinate(p: GeoPoint) -> bool {
    p.latitude.is_finite()
        && p.longitude.is_finite()
        && (-90.0..=90.0).contains(&p.latitude)
        && (-180.0..=180.0).contains(&p.longitude)
}

pub struct LocationService;

impl LocationService {
    /// True when `point` lies within the attendance radius of the course's school.
    ///
    /// The school's own radius wins over `default_radius_m`. A school without
    /// coordinates accepts nobody.
    pub async fn is_location_valid(
        db: &DatabaseConnection,
        course: &Course,
        point: GeoPoint,
        default_radius_m: f64,
    ) -> Result<bool, DbErr> {
        if !is_valid_coordinate(point) {
            return Ok(false);
        }

        let Some(school) = course.school(db).await? else {
            tracing::warn!(
                course_id = course.id,
                "course has no school; rejecting location check-in"
            );
            return Ok(false);
        };
        let Some(origin) = school.location() else {
            tracing::warn!(
                school_id = school.id,
                "school has no coordinates; rejecting location check-in"
            );
            return Ok(false);
        };

        let radius = school.attendance_radius_m.unwrap_or(default_radius_m);
        let distance = haversine_distance_m(origin, point);
        tracing::debug!(course_id = course.id, distance, radius, "location check");

        Ok(distance <= radius)
    }
}
