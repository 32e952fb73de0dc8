use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;

/// Operation offsets are encoded as `OPCODE_BASE + offset`, i.e. as the
/// small-integer opcodes `OP_1`..`OP_16`.
pub const OPCODE_BASE: u8 = 0x50;

/// Offset of the first token of every directory operation script.
pub const MARKER: u8 = 0x01;

/// Name reported for codes outside of the operation range.
pub const UNKNOWN_OPERATION: &str = "<unknown operation>";

/// Label reported for unrecognized object types.
pub const UNKNOWN_OBJECT_TYPE: &str = "Unknown";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum OperationCode {
    New = 0x02,
    Delete = 0x03,
    Revoke = 0x04,
    Modify = 0x05,
    Rename = 0x06,
    LinkRequest = 0x07,
    LinkAccept = 0x08,
    Audit = 0x09,
    Certificate = 0x0a,
    Identity = 0x0b,
    IdentityVerification = 0x0c,
    Channel = 0x0d,
    ChannelCheckpoint = 0x0e,
}

impl OperationCode {
    pub const FIRST: OperationCode = OperationCode::New;
    pub const LAST: OperationCode = OperationCode::ChannelCheckpoint;

    pub const ALL: [OperationCode; 13] = [
        OperationCode::New,
        OperationCode::Delete,
        OperationCode::Revoke,
        OperationCode::Modify,
        OperationCode::Rename,
        OperationCode::LinkRequest,
        OperationCode::LinkAccept,
        OperationCode::Audit,
        OperationCode::Certificate,
        OperationCode::Identity,
        OperationCode::IdentityVerification,
        OperationCode::Channel,
        OperationCode::ChannelCheckpoint,
    ];

    /// Operation for an offset strictly above `MARKER` and no greater than `LAST`.
    pub fn from_offset(offset: i32) -> Option<OperationCode> {
        if offset <= i32::from(MARKER) || offset > i32::from(OperationCode::LAST as u8) {
            return None;
        }
        Self::ALL.get((offset - i32::from(Self::FIRST as u8)) as usize).copied()
    }

    pub fn offset(self) -> u8 {
        self as u8
    }

    /// Script opcode byte carrying this operation.
    pub fn opcode(self) -> u8 {
        OPCODE_BASE + self.offset()
    }

    /// Canonical protocol identifier.
    pub fn name(self) -> &'static str {
        match self {
            OperationCode::New => "bdap_new",
            OperationCode::Delete => "bdap_delete",
            OperationCode::Revoke => "bdap_revoke",
            OperationCode::Modify => "bdap_update",
            OperationCode::Rename => "bdap_move",
            OperationCode::LinkRequest => "bdap_link_request",
            OperationCode::LinkAccept => "bdap_link_accept",
            OperationCode::Audit => "bdap_audit",
            OperationCode::Certificate => "bdap_certificate",
            OperationCode::Identity => "bdap_identity",
            OperationCode::IdentityVerification => "bdap_identity_verification",
            OperationCode::Channel => "bdap_new_channel",
            OperationCode::ChannelCheckpoint => "bdap_channel_checkpoint",
        }
    }

    pub fn from_name(name: &str) -> Option<OperationCode> {
        OPERATIONS_BY_NAME.get(name).copied()
    }
}

impl fmt::Display for OperationCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

lazy_static! {
    static ref OPERATIONS_BY_NAME: HashMap<&'static str, OperationCode> = OperationCode::ALL
        .iter()
        .map(|op| (op.name(), *op))
        .collect();
}

/// Name for a raw operation offset; never fails.
pub fn operation_name(offset: i32) -> &'static str {
    OperationCode::from_offset(offset).map_or(UNKNOWN_OPERATION, OperationCode::name)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u32)]
pub enum ObjectType {
    Default = 0,
    User = 1,
    Group = 2,
    Device = 3,
    Domain = 4,
    OrganizationalUnit = 5,
    Certificate = 6,
    Audit = 7,
    Channel = 8,
    Checkpoint = 9,
    LinkRequest = 10,
    LinkAccept = 11,
    Identity = 12,
    IdentityVerification = 13,
}

impl ObjectType {
    pub const ALL: [ObjectType; 14] = [
        ObjectType::Default,
        ObjectType::User,
        ObjectType::Group,
        ObjectType::Device,
        ObjectType::Domain,
        ObjectType::OrganizationalUnit,
        ObjectType::Certificate,
        ObjectType::Audit,
        ObjectType::Channel,
        ObjectType::Checkpoint,
        ObjectType::LinkRequest,
        ObjectType::LinkAccept,
        ObjectType::Identity,
        ObjectType::IdentityVerification,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ObjectType::Default => "Default",
            ObjectType::User => "User Entry",
            ObjectType::Group => "Group Entry",
            ObjectType::Device => "Device Entry",
            ObjectType::Domain => "Domain Entry",
            ObjectType::OrganizationalUnit => "OU Entry",
            ObjectType::Certificate => "Certificate Entry",
            ObjectType::Audit => "Audit Entry",
            ObjectType::Channel => "Channel Entry",
            ObjectType::Checkpoint => "Channel Checkpoint Entry",
            ObjectType::LinkRequest => "Link Request Entry",
            ObjectType::LinkAccept => "Link Accept Entry",
            ObjectType::Identity => "Identity Entry",
            ObjectType::IdentityVerification => "Identity Verification Entry",
        }
    }
}

impl From<ObjectType> for u32 {
    fn from(object_type: ObjectType) -> u32 {
        object_type as u32
    }
}

impl TryFrom<u32> for ObjectType {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        ObjectType::ALL.get(value as usize).copied().ok_or(value)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label for a raw object type value; never fails.
pub fn object_type_label(value: u32) -> &'static str {
    ObjectType::try_from(value).map_or(UNKNOWN_OBJECT_TYPE, ObjectType::label)
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_operation_offsets_are_contiguous() {
        for (i, op) in OperationCode::ALL.iter().enumerate() {
            assert_eq!(op.offset() as usize, OperationCode::FIRST as usize + i);
            assert_eq!(OperationCode::from_offset(i32::from(op.offset())), Some(*op));
        }
        assert_eq!(OperationCode::New.opcode(), 0x52);
        assert_eq!(OperationCode::ChannelCheckpoint.opcode(), 0x5e);
    }

    #[test]
    fn test_operation_offset_bounds() {
        assert_eq!(OperationCode::from_offset(0), None);
        assert_eq!(OperationCode::from_offset(-1), None);
        assert_eq!(OperationCode::from_offset(i32::from(MARKER)), None);
        assert_eq!(OperationCode::from_offset(15), None);
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(operation_name(2), "bdap_new");
        assert_eq!(operation_name(5), "bdap_update");
        assert_eq!(operation_name(6), "bdap_move");
        assert_eq!(operation_name(13), "bdap_new_channel");
        assert_eq!(operation_name(0), UNKNOWN_OPERATION);
        assert_eq!(operation_name(-1), UNKNOWN_OPERATION);
        assert_eq!(OperationCode::Audit.to_string(), "bdap_audit");
    }

    #[test]
    fn test_operation_name_lookup() {
        for op in OperationCode::ALL.iter() {
            assert_eq!(OperationCode::from_name(op.name()), Some(*op));
        }
        assert_eq!(OperationCode::from_name("BDAP_NEW"), None);
        assert_eq!(OperationCode::from_name(UNKNOWN_OPERATION), None);
    }

    #[test]
    fn test_object_type_labels() {
        assert_eq!(object_type_label(0), "Default");
        assert_eq!(object_type_label(1), "User Entry");
        assert_eq!(object_type_label(5), "OU Entry");
        assert_eq!(object_type_label(9), "Channel Checkpoint Entry");
        assert_eq!(object_type_label(13), "Identity Verification Entry");
        assert_eq!(object_type_label(14), UNKNOWN_OBJECT_TYPE);
    }

    #[test]
    fn test_object_type_round_trip() {
        for t in ObjectType::ALL.iter() {
            assert_eq!(ObjectType::try_from(u32::from(*t)), Ok(*t));
        }
        assert_eq!(ObjectType::try_from(99), Err(99));
    }

    proptest! {
        #[test]
        fn operation_name_is_total(offset in any::<i32>()) {
            let name = operation_name(offset);
            if (2..=14).contains(&offset) {
                prop_assert!(name.starts_with("bdap_"));
            } else {
                prop_assert_eq!(name, UNKNOWN_OPERATION);
            }
        }

        #[test]
        fn object_type_label_is_total(value in 14u32..) {
            prop_assert_eq!(object_type_label(value), UNKNOWN_OBJECT_TYPE);
        }
    }
}
