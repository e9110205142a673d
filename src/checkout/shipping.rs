//! Shipping Address

use std::fmt;

/// Delivery details collected at checkout. Only presence is checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingAddress {
    /// Recipient name
    pub full_name: String,

    /// Contact number
    pub phone_number: String,

    /// Street and house number
    pub street_address: String,

    /// City or town
    pub city: String,

    /// Parish
    pub parish: String,

    /// Division, optional
    pub division: String,

    /// Region code, e.g. `KL`
    pub region: String,
}

impl ShippingAddress {
    /// Check that every required field has a value.
    ///
    /// # Errors
    ///
    /// Returns the name of the first blank required field.
    pub fn validate(&self) -> Result<(), &'static str> {
        let required = [
            ("full name", &self.full_name),
            ("phone number", &self.phone_number),
            ("street address", &self.street_address),
            ("city", &self.city),
            ("parish", &self.parish),
            ("region", &self.region),
        ];

        match required
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
        {
            Some((field, _)) => Err(field),
            None => Ok(()),
        }
    }
}

/// Single-line form passed to the marketplace contract.
impl fmt::Display for ShippingAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name -> {} || Phone -> {} || Street -> {} || City -> {} || Parish -> {} || Division -> {} || Region -> {}",
            self.full_name,
            self.phone_number,
            self.street_address,
            self.city,
            self.parish,
            self.division,
            self.region,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kampala() -> ShippingAddress {
        ShippingAddress {
            full_name: "Amina Nakato".to_string(),
            phone_number: "+256 700 000000".to_string(),
            street_address: "Plot 4 Kampala Road".to_string(),
            city: "Kampala".to_string(),
            parish: "Nakasero".to_string(),
            division: "Central".to_string(),
            region: "KL".to_string(),
        }
    }

    #[test]
    fn complete_address_is_valid() {
        assert_eq!(kampala().validate(), Ok(()));
    }

    #[test]
    fn division_is_optional() {
        let address = ShippingAddress {
            division: String::new(),
            ..kampala()
        };

        assert_eq!(address.validate(), Ok(()));
    }

    #[test]
    fn blank_field_is_reported() {
        let address = ShippingAddress {
            city: "   ".to_string(),
            region: String::new(),
            ..kampala()
        };

        assert_eq!(address.validate(), Err("city"));
    }

    #[test]
    fn details_string_includes_region() {
        assert_eq!(
            kampala().to_string(),
            "Name -> Amina Nakato || Phone -> +256 700 000000 || Street -> Plot 4 Kampala Road || \
             City -> Kampala || Parish -> Nakasero || Division -> Central || Region -> KL"
        );
    }
}
