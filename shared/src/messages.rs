//! Success sentinels sent by the auth service.
//!
//! The service signals success through exact message strings rather than a
//! status field. These are matched byte for byte, including the misspelling
//! and trailing space in [`REGISTERED`].

/// `POST /user/login`
pub const LOGIN_SUCCESSFUL: &str = "Login successful";

/// `POST /user` replies with this bare JSON string.
pub const REGISTERED: &str = "Thank You! Succesfully Completed ";

/// `POST /auth/google/token`
pub const GOOGLE_LOGIN_SUCCESSFUL: &str = "Google login successful";

/// `PUT /user/update`
pub const PROFILE_UPDATED: &str = "Profile updated successfully";

/// `PUT /user/change-password`
pub const PASSWORD_CHANGED: &str = "Password changed successfully";

/// `PUT /user/password-reset`
pub const PASSWORD_RESET: &str = "Password updated successfully";

/// `POST /product`
pub const PRODUCT_ADDED: &str = "Product added successfully";

/// `DELETE /product/{id}`
pub const PRODUCT_DELETED: &str = "Product deleted successfully";
