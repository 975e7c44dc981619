mod v1_add_encryption_fields;
mod v2_encrypt_existing_memories;

pub use v1_add_encryption_fields::AddEncryptionFields;
pub use v2_encrypt_existing_memories::EncryptExistingMemories;
