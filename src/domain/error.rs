use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Input,
    Dns,
    Resolver,
    Dial,
    Tls,
    Http,
    Timeout,
    Redirect,
    Body,
    Other,
}

impl ErrorClass {
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorClass::Input => 2,
            ErrorClass::Dns | ErrorClass::Resolver => 3,
            ErrorClass::Dial => 4,
            ErrorClass::Tls => 5,
            ErrorClass::Http => 6,
            ErrorClass::Timeout => 7,
            ErrorClass::Redirect => 8,
            ErrorClass::Body => 9,
            ErrorClass::Other => 1,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ErrorClass::Input => "INPUT",
            ErrorClass::Dns => "DNS",
            ErrorClass::Resolver => "RESOLVER",
            ErrorClass::Dial => "DIAL",
            ErrorClass::Tls => "TLS",
            ErrorClass::Http => "HTTP",
            ErrorClass::Timeout => "TIMEOUT",
            ErrorClass::Redirect => "REDIRECT",
            ErrorClass::Body => "BODY",
            ErrorClass::Other => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("error[{}]: {message}", .class.tag())]
pub struct HopstatError {
    pub class: ErrorClass,
    pub message: String,
}

impl HopstatError {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self { class, message: message.into() }
    }

    pub fn input(msg: impl Into<String>) -> Self { Self::new(ErrorClass::Input, msg) }
    pub fn dns(msg: impl Into<String>) -> Self { Self::new(ErrorClass::Dns, msg) }
    pub fn resolver(msg: impl Into<String>) -> Self { Self::new(ErrorClass::Resolver, msg) }
    pub fn dial(msg: impl Into<String>) -> Self { Self::new(ErrorClass::Dial, msg) }
    pub fn tls(msg: impl Into<String>) -> Self { Self::new(ErrorClass::Tls, msg) }
    pub fn http(msg: impl Into<String>) -> Self { Self::new(ErrorClass::Http, msg) }
    pub fn timeout(msg: impl Into<String>) -> Self { Self::new(ErrorClass::Timeout, msg) }
    pub fn redirect(msg: impl Into<String>) -> Self { Self::new(ErrorClass::Redirect, msg) }
    pub fn body(msg: impl Into<String>) -> Self { Self::new(ErrorClass::Body, msg) }
    pub fn other(msg: impl Into<String>) -> Self { Self::new(ErrorClass::Other, msg) }

    pub fn is(&self, class: ErrorClass) -> bool {
        self.class == class
    }
}
