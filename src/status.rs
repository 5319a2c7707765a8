//! Response status table.
//!
//! [`ApiStatus`] mirrors the registered HTTP status codes and adds three
//! synthetic members: [`ApiStatus::None`] (no response was produced),
//! [`ApiStatus::Unknown`] (the server sent a code outside the table) and
//! [`ApiStatus::TimedOut`] (every attempt timed out).

use std::fmt;

macro_rules! api_statuses {
    ($($(#[$doc:meta])* $name:ident = $code:literal,)+) => {
        /// Outcome status of an API call.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ApiStatus {
            /// No response was received.
            None,
            /// The server returned a code outside the known table.
            Unknown,
            /// The request timed out on every permitted attempt.
            TimedOut,
            $($(#[$doc])* $name,)+
        }

        impl ApiStatus {
            /// Maps a numeric status code into the table.
            ///
            /// Codes outside the table degrade to [`ApiStatus::Unknown`].
            pub fn from_code(code: u16) -> Self {
                match code {
                    $($code => ApiStatus::$name,)+
                    _ => ApiStatus::Unknown,
                }
            }

            /// Returns the numeric code, or `None` for synthetic members.
            pub fn code(&self) -> Option<u16> {
                match self {
                    ApiStatus::None | ApiStatus::Unknown | ApiStatus::TimedOut => None,
                    $(ApiStatus::$name => Some($code),)+
                }
            }

            fn name(&self) -> &'static str {
                match self {
                    ApiStatus::None => "None",
                    ApiStatus::Unknown => "Unknown",
                    ApiStatus::TimedOut => "TimedOut",
                    $(ApiStatus::$name => stringify!($name),)+
                }
            }
        }
    };
}

api_statuses! {
    Continue = 100,
    SwitchingProtocols = 101,
    Processing = 102,
    EarlyHints = 103,
    Ok = 200,
    Created = 201,
    Accepted = 202,
    NonAuthoritativeInformation = 203,
    NoContent = 204,
    ResetContent = 205,
    PartialContent = 206,
    MultiStatus = 207,
    AlreadyReported = 208,
    ImUsed = 226,
    MultipleChoices = 300,
    MovedPermanently = 301,
    Found = 302,
    SeeOther = 303,
    NotModified = 304,
    UseProxy = 305,
    TemporaryRedirect = 307,
    PermanentRedirect = 308,
    BadRequest = 400,
    Unauthorized = 401,
    PaymentRequired = 402,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    NotAcceptable = 406,
    ProxyAuthenticationRequired = 407,
    RequestTimeout = 408,
    Conflict = 409,
    Gone = 410,
    LengthRequired = 411,
    PreconditionFailed = 412,
    PayloadTooLarge = 413,
    UriTooLong = 414,
    UnsupportedMediaType = 415,
    RangeNotSatisfiable = 416,
    ExpectationFailed = 417,
    ImATeapot = 418,
    MisdirectedRequest = 421,
    UnprocessableEntity = 422,
    Locked = 423,
    FailedDependency = 424,
    TooEarly = 425,
    UpgradeRequired = 426,
    PreconditionRequired = 428,
    TooManyRequests = 429,
    RequestHeaderFieldsTooLarge = 431,
    UnavailableForLegalReasons = 451,
    InternalServerError = 500,
    NotImplemented = 501,
    BadGateway = 502,
    ServiceUnavailable = 503,
    GatewayTimeout = 504,
    HttpVersionNotSupported = 505,
    VariantAlsoNegotiates = 506,
    InsufficientStorage = 507,
    LoopDetected = 508,
    NotExtended = 510,
    NetworkAuthenticationRequired = 511,
}

impl ApiStatus {
    /// Returns `true` only for `200`, `201`, `202` and `204`.
    ///
    /// Other 2xx codes are part of the table but are not treated as success.
    ///
    /// ```
    /// use ferrapi::ApiStatus;
    ///
    /// assert!(ApiStatus::Ok.is_success_code());
    /// assert!(ApiStatus::NoContent.is_success_code());
    /// assert!(!ApiStatus::PartialContent.is_success_code());
    /// ```
    pub fn is_success_code(&self) -> bool {
        matches!(
            self,
            ApiStatus::Ok | ApiStatus::Created | ApiStatus::Accepted | ApiStatus::NoContent
        )
    }

    /// Returns `true` for 4xx members.
    pub fn is_client_error(&self) -> bool {
        matches!(self.code(), Some(400..=499))
    }

    /// Returns `true` for 5xx members.
    pub fn is_server_error(&self) -> bool {
        matches!(self.code(), Some(500..=599))
    }
}

impl From<http::StatusCode> for ApiStatus {
    fn from(status: http::StatusCode) -> Self {
        ApiStatus::from_code(status.as_u16())
    }
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => write!(f, "{} {}", code, self.name()),
            None => f.write_str(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_set_is_closed() {
        for code in 100u16..600 {
            let status = ApiStatus::from_code(code);
            let expected = matches!(code, 200 | 201 | 202 | 204);
            assert_eq!(status.is_success_code(), expected, "code {}", code);
        }
    }

    #[test]
    fn test_other_2xx_are_mapped_but_not_successful() {
        assert_eq!(ApiStatus::from_code(203), ApiStatus::NonAuthoritativeInformation);
        assert_eq!(ApiStatus::from_code(205), ApiStatus::ResetContent);
        assert_eq!(ApiStatus::from_code(206), ApiStatus::PartialContent);
        assert!(!ApiStatus::PartialContent.is_success_code());
    }

    #[test]
    fn test_unmappable_codes_degrade_to_unknown() {
        assert_eq!(ApiStatus::from_code(299), ApiStatus::Unknown);
        assert_eq!(ApiStatus::from_code(999), ApiStatus::Unknown);
        assert_eq!(ApiStatus::from_code(0), ApiStatus::Unknown);
    }

    #[test]
    fn test_code_round_trips_through_table() {
        assert_eq!(ApiStatus::NotFound.code(), Some(404));
        assert_eq!(ApiStatus::from_code(404), ApiStatus::NotFound);
        assert_eq!(ApiStatus::TimedOut.code(), None);
        assert!(ApiStatus::NotFound.is_client_error());
        assert!(ApiStatus::BadGateway.is_server_error());
        assert!(!ApiStatus::None.is_server_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(ApiStatus::Ok.to_string(), "200 Ok");
        assert_eq!(ApiStatus::TimedOut.to_string(), "TimedOut");
    }
}
