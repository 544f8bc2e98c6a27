use shared::data::Registration;

use super::entities::registration::Model as RegistrationModel;

impl From<RegistrationModel> for Registration {
    fn from(value: RegistrationModel) -> Self {
        Self {
            id: value.id,
            plate_number: value.plate_number,
            owner_name: value.owner_name,
            created_at: value.created_at,
        }
    }
}
