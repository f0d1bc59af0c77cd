//! Integration tests for larkpush-drive
//!
//! Uses wiremock to simulate the Lark/Feishu open platform and verifies
//! end-to-end behavior of token exchange, folder lookup/creation, and
//! multipart uploads through the drive provider.


mod test_auth;
mod test_folders;
mod test_upload;
