// ABOUTME: Per-client rate limiting keyed by IP address
// ABOUTME: Endpoint categories get separate quotas; lead forms are the strictest

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use porchlight_api::AppError;
use tracing::{debug, warn};

/// Requests per minute for each endpoint category
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub health_rpm: u32,
    /// Form, testimonial and saved-timeline submissions
    pub forms_rpm: u32,
    /// Experiment assignment/events and short-link redirects
    pub tracking_rpm: u32,
    pub admin_rpm: u32,
    pub global_rpm: u32,
    /// Burst allowance in tenths of the per-minute rate
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            health_rpm: 60,
            forms_rpm: 5,
            tracking_rpm: 120,
            admin_rpm: 120,
            global_rpm: 60,
            burst_size: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointCategory {
    Health,
    Forms,
    Tracking,
    Admin,
    Other,
}

impl EndpointCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            EndpointCategory::Health => "health",
            EndpointCategory::Forms => "forms",
            EndpointCategory::Tracking => "tracking",
            EndpointCategory::Admin => "admin",
            EndpointCategory::Other => "other",
        }
    }
}

/// Categorize a request by method and path
pub fn categorize_endpoint(method: &Method, path: &str) -> EndpointCategory {
    if path.starts_with("/api/admin") {
        EndpointCategory::Admin
    } else if path.starts_with("/api/health") {
        EndpointCategory::Health
    } else if path.starts_with("/l/") || path.starts_with("/api/experiments") {
        EndpointCategory::Tracking
    } else if method == Method::POST
        && (path.starts_with("/api/forms")
            || path.starts_with("/api/testimonials")
            || path.starts_with("/api/timelines"))
    {
        EndpointCategory::Forms
    } else {
        EndpointCategory::Other
    }
}

struct CategoryLimiter {
    rpm: u32,
    limiter: DefaultKeyedRateLimiter<IpAddr>,
}

impl CategoryLimiter {
    fn new(category: EndpointCategory, rpm: u32, burst_size: u32) -> Self {
        let per_minute = NonZeroU32::new(rpm).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(rpm.saturating_mul(burst_size) / 10).unwrap_or(per_minute);

        debug!(
            endpoint_category = %category.as_str(),
            rpm = %rpm,
            burst = %burst,
            "Created rate limiter for endpoint category"
        );

        Self {
            rpm,
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute).allow_burst(burst)),
        }
    }
}

/// Shared limiter state, one keyed limiter per category
#[derive(Clone)]
pub struct RateLimitLayer {
    enabled: bool,
    health: Arc<CategoryLimiter>,
    forms: Arc<CategoryLimiter>,
    tracking: Arc<CategoryLimiter>,
    admin: Arc<CategoryLimiter>,
    other: Arc<CategoryLimiter>,
}

impl RateLimitLayer {
    pub fn new(config: RateLimitConfig) -> Self {
        let build = |category, rpm| Arc::new(CategoryLimiter::new(category, rpm, config.burst_size));
        Self {
            enabled: config.enabled,
            health: build(EndpointCategory::Health, config.health_rpm),
            forms: build(EndpointCategory::Forms, config.forms_rpm),
            tracking: build(EndpointCategory::Tracking, config.tracking_rpm),
            admin: build(EndpointCategory::Admin, config.admin_rpm),
            other: build(EndpointCategory::Other, config.global_rpm),
        }
    }

    fn limiter_for(&self, category: EndpointCategory) -> &CategoryLimiter {
        match category {
            EndpointCategory::Health => &*self.health,
            EndpointCategory::Forms => &*self.forms,
            EndpointCategory::Tracking => &*self.tracking,
            EndpointCategory::Admin => &*self.admin,
            EndpointCategory::Other => &*self.other,
        }
    }

    /// Check one request; the error carries seconds until the next slot
    pub fn check(&self, category: EndpointCategory, client: IpAddr) -> Result<u32, AppError> {
        let entry = self.limiter_for(category);
        match entry.limiter.check_key(&client) {
            Ok(()) => Ok(entry.rpm),
            Err(not_until) => {
                let wait = not_until.wait_time_from(DefaultClock::default().now());
                let retry_after = wait.as_secs().max(1);
                Err(AppError::rate_limited(retry_after, entry.rpm))
            }
        }
    }

    /// Drop per-client state that has fully replenished
    pub fn retain_recent(&self) {
        for entry in [&self.health, &self.forms, &self.tracking, &self.admin, &self.other] {
            entry.limiter.retain_recent();
        }
    }
}

pub async fn rate_limit_middleware(
    State(layer): State<RateLimitLayer>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !layer.enabled {
        return Ok(next.run(request).await);
    }

    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    let category = categorize_endpoint(request.method(), request.uri().path());

    let limit = match layer.check(category, client) {
        Ok(limit) => limit,
        Err(e) => {
            warn!(
                client = %client,
                endpoint_category = %category.as_str(),
                path = %request.uri().path(),
                audit = true,
                "Rate limit exceeded"
            );
            return Err(e);
        }
    };

    let mut response = next.run(request).await;
    response.headers_mut().insert(
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderValue::from(limit),
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Method::GET, "/api/health", EndpointCategory::Health)]
    #[case(Method::POST, "/api/forms/contact", EndpointCategory::Forms)]
    #[case(Method::POST, "/api/forms/cash-offer", EndpointCategory::Forms)]
    #[case(Method::POST, "/api/testimonials", EndpointCategory::Forms)]
    #[case(Method::GET, "/api/testimonials", EndpointCategory::Other)]
    #[case(Method::POST, "/api/timelines", EndpointCategory::Forms)]
    #[case(Method::PUT, "/api/timelines/abc/progress", EndpointCategory::Other)]
    #[case(Method::GET, "/l/promo", EndpointCategory::Tracking)]
    #[case(Method::POST, "/api/experiments/hero/events", EndpointCategory::Tracking)]
    #[case(Method::POST, "/api/admin/links", EndpointCategory::Admin)]
    #[case(Method::GET, "/api/timeline", EndpointCategory::Other)]
    fn test_categorize_endpoint(
        #[case] method: Method,
        #[case] path: &str,
        #[case] expected: EndpointCategory,
    ) {
        assert_eq!(categorize_endpoint(&method, path), expected);
    }

    #[test]
    fn test_forms_limit_is_per_client() {
        let layer = RateLimitLayer::new(RateLimitConfig {
            forms_rpm: 2,
            burst_size: 10,
            ..RateLimitConfig::default()
        });
        let alice: IpAddr = "10.0.0.1".parse().unwrap();
        let bob: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(layer.check(EndpointCategory::Forms, alice).is_ok());
        assert!(layer.check(EndpointCategory::Forms, alice).is_ok());
        match layer.check(EndpointCategory::Forms, alice) {
            Err(AppError::RateLimitExceeded { retry_after, limit }) => {
                assert!(retry_after >= 1);
                assert_eq!(limit, 2);
            }
            other => panic!("expected rate limit error, got {:?}", other),
        }

        assert!(layer.check(EndpointCategory::Forms, bob).is_ok());
        assert!(layer.check(EndpointCategory::Health, alice).is_ok());
    }

    #[test]
    fn test_zero_rpm_still_allows_a_request() {
        let layer = RateLimitLayer::new(RateLimitConfig {
            global_rpm: 0,
            ..RateLimitConfig::default()
        });
        let client: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(layer.check(EndpointCategory::Other, client).is_ok());
    }
}
