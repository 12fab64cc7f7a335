//! Certificate request data model.

use serde::{Deserialize, Serialize};

/// A completed course and its workload in hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    /// Workload in hours. Whole numbers display without a fractional part.
    pub hours: f64,
}

impl Course {
    pub fn new(name: impl Into<String>, hours: f64) -> Self {
        Self {
            name: name.into(),
            hours,
        }
    }
}

impl<S: Into<String>> From<(S, f64)> for Course {
    fn from((name, hours): (S, f64)) -> Self {
        Self::new(name, hours)
    }
}

impl<S: Into<String>> From<(S, u32)> for Course {
    fn from((name, hours): (S, u32)) -> Self {
        Self::new(name, f64::from(hours))
    }
}

/// Everything printed on a single certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateRequest {
    pub recipient: String,
    /// Courses in the order they should be listed.
    #[serde(default)]
    pub courses: Vec<Course>,
    /// Completion date, already formatted for display.
    pub completion_date: String,
}

impl CertificateRequest {
    pub fn new<I, C>(
        recipient: impl Into<String>,
        courses: I,
        completion_date: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Course>,
    {
        Self {
            recipient: recipient.into(),
            courses: courses.into_iter().map(Into::into).collect(),
            completion_date: completion_date.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_preserves_course_order() {
        let request = CertificateRequest::new(
            "Ana Silva",
            [("Redes", 60), ("Python", 30), ("Lógica", 20)],
            "01/01/2024",
        );
        let names: Vec<&str> = request.courses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Redes", "Python", "Lógica"]);
    }

    #[test]
    fn test_hours_display() {
        assert_eq!(Course::new("A", 20.0).hours.to_string(), "20");
        assert_eq!(Course::new("A", 1.5).hours.to_string(), "1.5");
    }
}
