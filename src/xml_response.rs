use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};

// Wholesale availability document (net rates)
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
#[serde(rename = "AvailRS")]
pub struct XmlAvailResponse {
    pub hotels: XmlHotels,
}

impl XmlAvailResponse {
    pub fn hotels(&self) -> &[XmlHotel] {
        &self.hotels.hotels
    }
}

pub fn decode_avail_xml(xml: &str) -> Result<XmlAvailResponse, quick_xml::DeError> {
    from_str(xml)
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlHotels {
    #[serde(rename = "Hotel")]
    pub hotels: Vec<XmlHotel>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlHotel {
    #[serde(rename = "@code")]
    pub hotel_id: String,
    #[serde(rename = "@name")]
    pub hotel_name: String,
    #[serde(rename = "@latitude")]
    pub latitude: String,
    #[serde(rename = "@longitude")]
    pub longitude: String,
    #[serde(rename = "@category")]
    pub category: String,
    #[serde(rename = "@address")]
    pub address: String,
    #[serde(rename = "@city")]
    pub city: String,
    #[serde(rename = "@countryCode")]
    pub country_code: String,
    pub meal_plans: XmlMealPlans,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlMealPlans {
    #[serde(rename = "MealPlan")]
    pub meal_plans: Vec<XmlMealPlan>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlMealPlan {
    #[serde(rename = "@code")]
    pub code: String,
    pub options: XmlOptions,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlOptions {
    #[serde(rename = "Option")]
    pub options: Vec<XmlOption>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlOption {
    pub price: XmlPrice,
    pub rooms: XmlRooms,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlPrice {
    #[serde(rename = "@currency")]
    pub currency: String,
    #[serde(rename = "@amount")]
    pub amount: String,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlRooms {
    #[serde(rename = "Room")]
    pub rooms: Vec<XmlRoom>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlRoom {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@code")]
    pub code: String,
    #[serde(rename = "@description")]
    pub description: String,
    #[serde(rename = "@maxOccupancy")]
    pub max_occupancy: String,
    #[serde(rename = "@nonRefundable")]
    pub non_refundable: String,
    pub price: XmlPrice,
    pub cancel_penalties: XmlCancelPenalties,
}

impl XmlRoom {
    // Rooms without their own flag inherit the one on CancelPenalties
    pub fn is_refundable(&self) -> bool {
        let flag = match self.non_refundable.trim() {
            "" => self.cancel_penalties.non_refundable.trim(),
            own => own,
        };
        !flag.eq_ignore_ascii_case("true")
    }
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlCancelPenalties {
    #[serde(rename = "@nonRefundable")]
    pub non_refundable: String,
    #[serde(rename = "CancelPenalty")]
    pub cancel_penalties: Vec<XmlCancelPenalty>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlCancelPenalty {
    pub deadline: String,
}

#[cfg(test)]
pub(crate) const SAMPLE_AVAIL_XML: &str = r#"
<AvailRS>
  <Hotels>
    <Hotel code="39776757" name="Hotel Lutetia" latitude="48.8511" longitude="2.3270" category="5" address="45 Boulevard Raspail" city="Paris" countryCode="FR">
      <MealPlans>
        <MealPlan code="RO">
          <Options>
            <Option type="Hotel" paymentType="MerchantPay" status="OK">
              <Price currency="EUR" amount="200.00"/>
              <Rooms>
                <Room id="1#DBL" code="DBL" description="Double Room" maxOccupancy="2" nonRefundable="false">
                  <Price currency="EUR" amount="200.00"/>
                  <CancelPenalties nonRefundable="false">
                    <CancelPenalty>
                      <HoursBefore>48</HoursBefore>
                      <Penalty type="Importe" currency="EUR">100.00</Penalty>
                      <Deadline>2026-11-08T12:00:00Z</Deadline>
                    </CancelPenalty>
                  </CancelPenalties>
                </Room>
              </Rooms>
            </Option>
          </Options>
        </MealPlan>
        <MealPlan code="BB">
          <Options>
            <Option type="Hotel" paymentType="MerchantPay" status="OK">
              <Price currency="EUR" amount="260.00"/>
              <Rooms>
                <Room id="1#DBL" code="DBL" description="Double Room" maxOccupancy="2" nonRefundable="true">
                  <Price currency="EUR" amount="260.00"/>
                  <CancelPenalties nonRefundable="true"/>
                </Room>
              </Rooms>
            </Option>
          </Options>
        </MealPlan>
      </MealPlans>
    </Hotel>
  </Hotels>
</AvailRS>
"#;
