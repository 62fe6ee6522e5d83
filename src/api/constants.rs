//! API Constants for the Dynamics 365 Web API

/// Base API path; the version segment is appended by the version manager
pub const API_BASE_PATH: &str = "/api/data";

/// Major version assumed until discovery says otherwise
pub const DEFAULT_MAJOR_VERSION: u32 = 9;

/// Minor version assumed until discovery says otherwise
pub const DEFAULT_MINOR_VERSION: u32 = 0;

/// Lowest major version the Web API has ever shipped with
pub const MIN_MAJOR_VERSION: u32 = 9;

/// Function returning the server version, relative to the versioned API path
pub const RETRIEVE_VERSION_ENDPOINT: &str = "/RetrieveVersion";

/// Namespace prefix for bound actions
pub const ACTION_NAMESPACE: &str = "Microsoft.Dynamics.CRM";

/// Placeholder message when a failed response carries no readable error
pub const UNEXPECTED_ERROR: &str = "Unexpected Error";

/// Status codes treated as success. 1223 is how some stacks report 204.
pub const SUCCESS_STATUSES: [u16; 4] = [200, 201, 204, 1223];

/// Standard headers for Dynamics 365 requests; names are lowercase as `HeaderMap` stores them
pub mod headers {
    pub const ODATA_MAX_VERSION: &str = "odata-maxversion";
    pub const ODATA_VERSION: &str = "odata-version";
    pub const PREFER: &str = "prefer";

    /// Impersonation header carrying the systemuserid to act as
    pub const CALLER_ID: &str = "mscrmcallerid";

    /// Returned on create with the URL of the new record
    pub const ODATA_ENTITY_ID: &str = "odata-entityid";

    /// OData protocol version sent in both version headers
    pub const ODATA_PROTOCOL_VERSION: &str = "4.0";

    pub const ACCEPT_JSON: &str = "application/json";

    pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

    /// Ask the server to include formatted values next to raw ones
    pub const PREFER_FORMATTED_VALUES: &str =
        "odata.include-annotations=OData.Community.Display.V1.FormattedValue";
}

/// Whether a status code counts as a successful round-trip
pub fn is_success_status(status: u16) -> bool {
    SUCCESS_STATUSES.contains(&status)
}

/// Strip the braces Dynamics forms put around GUIDs
pub fn normalize_id(id: &str) -> String {
    id.trim().replace(['{', '}'], "")
}

/// Build entity set path
pub fn entity_path(entity: &str) -> String {
    format!("/{}", entity)
}

/// Build entity record path
pub fn entity_record_path(entity: &str, id: &str) -> String {
    format!("/{}({})", entity, normalize_id(id))
}
