//! Branch DTOs

use serde::Deserialize;

use domain_case::CreateBranchRequest;

#[derive(Debug, Deserialize)]
pub struct CreateBranchBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl From<CreateBranchBody> for CreateBranchRequest {
    fn from(body: CreateBranchBody) -> Self {
        CreateBranchRequest {
            name: body.name,
            code: body.code,
            address: body.address,
            phone: body.phone,
        }
    }
}
