//! Color classification for latency and throughput figures

use colored::Color;

/// Latency classification for color coding
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LatencyLevel {
    Excellent, // < 20ms
    Good,      // 20-50ms
    Fair,      // 50-150ms
    Poor,      // >= 150ms
}

impl LatencyLevel {
    pub fn from_latency(latency_ms: f64) -> Self {
        if latency_ms < 20.0 {
            Self::Excellent
        } else if latency_ms < 50.0 {
            Self::Good
        } else if latency_ms < 150.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Red,
        }
    }
}

/// Throughput classification for color coding
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedLevel {
    Fast,     // >= 100 Mbps
    Moderate, // 25-100 Mbps
    Slow,     // 5-25 Mbps
    VerySlow, // < 5 Mbps
}

impl SpeedLevel {
    pub fn from_mbps(mbps: f64) -> Self {
        if mbps >= 100.0 {
            Self::Fast
        } else if mbps >= 25.0 {
            Self::Moderate
        } else if mbps >= 5.0 {
            Self::Slow
        } else {
            Self::VerySlow
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Fast => Color::Green,
            Self::Moderate => Color::Cyan,
            Self::Slow => Color::Yellow,
            Self::VerySlow => Color::Red,
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub label: Color,
    pub warning: Color,
    pub error: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            label: Color::Cyan,
            warning: Color::Yellow,
            error: Color::Red,
            muted: Color::BrightBlack,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_levels() {
        assert_eq!(LatencyLevel::from_latency(5.0), LatencyLevel::Excellent);
        assert_eq!(LatencyLevel::from_latency(20.0), LatencyLevel::Good);
        assert_eq!(LatencyLevel::from_latency(120.0), LatencyLevel::Fair);
        assert_eq!(LatencyLevel::from_latency(400.0), LatencyLevel::Poor);
        // Latency can come out negative when server time exceeds the round trip
        assert_eq!(LatencyLevel::from_latency(-1.0), LatencyLevel::Excellent);
    }

    #[test]
    fn test_speed_levels() {
        assert_eq!(SpeedLevel::from_mbps(940.0), SpeedLevel::Fast);
        assert_eq!(SpeedLevel::from_mbps(50.0), SpeedLevel::Moderate);
        assert_eq!(SpeedLevel::from_mbps(5.0), SpeedLevel::Slow);
        assert_eq!(SpeedLevel::from_mbps(0.5).color(), Color::Red);
    }
}
