//! Standard descriptions for LDAP result codes.
//!
//! Kept free of any connection state so the mapping can be exercised without a directory.

/// Returns the standard description of an LDAP result code, if it is a known code.
#[must_use]
pub fn describe(code: u32) -> Option<&'static str> {
    let text = match code {
        0 => "Success",
        1 => "Operations Error",
        2 => "Protocol Error",
        3 => "Time Limit Exceeded",
        4 => "Size Limit Exceeded",
        5 => "Compare False",
        6 => "Compare True",
        7 => "Auth Method Not Supported",
        8 => "Strong Auth Required",
        10 => "Referral",
        11 => "Admin Limit Exceeded",
        12 => "Unavailable Critical Extension",
        13 => "Confidentiality Required",
        14 => "SASL Bind In Progress",
        16 => "No Such Attribute",
        17 => "Undefined Attribute Type",
        18 => "Inappropriate Matching",
        19 => "Constraint Violation",
        20 => "Attribute Or Value Exists",
        21 => "Invalid Attribute Syntax",
        32 => "No Such Object",
        33 => "Alias Problem",
        34 => "Invalid DN Syntax",
        35 => "Is Leaf",
        36 => "Alias Dereferencing Problem",
        48 => "Inappropriate Authentication",
        49 => "Invalid Credentials",
        50 => "Insufficient Access Rights",
        51 => "Busy",
        52 => "Unavailable",
        53 => "Unwilling To Perform",
        54 => "Loop Detect",
        60 => "Sort Control Missing",
        61 => "Offset Range Error",
        64 => "Naming Violation",
        65 => "Object Class Violation",
        66 => "Not Allowed On Non Leaf",
        67 => "Not Allowed On RDN",
        68 => "Entry Already Exists",
        69 => "Object Class Modifications Prohibited",
        70 => "Results Too Large",
        71 => "Affects Multiple DSAs",
        76 => "Virtual List View Error or Control Error",
        80 => "Other",
        118 => "Canceled",
        119 => "No Such Operation",
        120 => "Too Late",
        121 => "Cannot Cancel",
        122 => "Assertion Failed",
        123 => "Authorization Denied",
        4096 => "Sync Refresh Required",
        _ => return None,
    };
    Some(text)
}
