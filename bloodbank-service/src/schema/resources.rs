//! The six blood bank resources

use super::{CreatedMessage, FieldSpec, Join, OrderBy, ResourceSchema};

const AGE_RULE: &str = "Age must be a valid number and 18 or older.";
const DATE_RULE: &str = "Date must be in YYYY-MM-DD format.";

pub static BLOOD_TYPES: ResourceSchema = ResourceSchema {
    path: "blood-types",
    label: "Blood Type",
    noun: "blood type",
    plural: "blood types",
    create_verb: "creating",
    table: "blood_type",
    fields: &[
        FieldSpec::text("Blood_Type_ID", "blood_type_id", "Blood Type ID").primary_key(),
        FieldSpec::text("Name", "name", "Name").required().unique(),
    ],
    created: CreatedMessage::Titled("Name"),
    dependents: "other records",
    joins: &[],
    order: &[OrderBy::asc("blood_type_id")],
};

pub static HOSPITALS: ResourceSchema = ResourceSchema {
    path: "hospitals",
    label: "Hospital",
    noun: "hospital",
    plural: "hospitals",
    create_verb: "creating",
    table: "hospital",
    fields: &[
        FieldSpec::text("Hospital_ID", "hospital_id", "Hospital ID").primary_key(),
        FieldSpec::text("Name", "name", "Name").required(),
        FieldSpec::text("Address", "address", "Address"),
        FieldSpec::text("Contact_Number", "contact_number", "Contact Number").required(),
    ],
    created: CreatedMessage::Titled("Name"),
    dependents: "transactions",
    joins: &[],
    order: &[OrderBy::asc("hospital_id")],
};

pub static DONORS: ResourceSchema = ResourceSchema {
    path: "donors",
    label: "Donor",
    noun: "donor",
    plural: "donors",
    create_verb: "creating",
    table: "donor",
    fields: &[
        FieldSpec::text("Donor_ID", "donor_id", "Donor ID").primary_key(),
        FieldSpec::text("Name", "name", "Name").required(),
        FieldSpec::text("Contact_Number", "contact_number", "Contact Number").required(),
        FieldSpec::text("Blood_Type_ID", "blood_type_id", "Blood Type ID")
            .required()
            .references("blood_type", "blood_type_id"),
        FieldSpec::text("Donor_Card_ID", "donor_card_id", "Donation Card ID")
            .unique()
            .on_duplicate(
                "Donation Card ID '{value}' is already assigned.",
                "Donation Card ID '{value}' is already assigned to another donor.",
            ),
        FieldSpec::integer("Age", "age", "Age", Some(18))
            .required()
            .rule(AGE_RULE),
    ],
    created: CreatedMessage::Titled("Name"),
    dependents: "other records (Transactions/Recipients)",
    joins: &[Join {
        alias: "Blood_Type_Name",
        via: "blood_type_id",
        table: "blood_type",
        target: "blood_type_id",
        display: "name",
    }],
    order: &[OrderBy::asc("donor_id")],
};

pub static RECIPIENTS: ResourceSchema = ResourceSchema {
    path: "recipients",
    label: "Recipient",
    noun: "recipient",
    plural: "recipients",
    create_verb: "creating",
    table: "recipient",
    fields: &[
        FieldSpec::text("Recipient_ID", "recipient_id", "Recipient ID").primary_key(),
        FieldSpec::text("Name", "name", "Name").required(),
        FieldSpec::text("Contact_Number", "contact_number", "Contact Number").required(),
        FieldSpec::text("Blood_Type_ID", "blood_type_id", "Blood Type ID")
            .required()
            .references("blood_type", "blood_type_id"),
        FieldSpec::text("Donor_ID", "donor_id", "Directed Donor ID")
            .references("donor", "donor_id"),
    ],
    created: CreatedMessage::Titled("Name"),
    dependents: "recipient transactions",
    joins: &[Join {
        alias: "Blood_Type_Name",
        via: "blood_type_id",
        table: "blood_type",
        target: "blood_type_id",
        display: "name",
    }],
    order: &[OrderBy::asc("recipient_id")],
};

pub static DONOR_TRANSACTIONS: ResourceSchema = ResourceSchema {
    path: "donor-transactions",
    label: "Donor Transaction",
    noun: "donor transaction",
    plural: "donor transactions",
    create_verb: "recording",
    table: "donor_transaction",
    fields: &[
        FieldSpec::text("Donor_Trans_ID", "donor_trans_id", "Transaction ID").primary_key(),
        FieldSpec::text("Donor_ID", "donor_id", "Donor ID")
            .required()
            .references("donor", "donor_id"),
        FieldSpec::text(
            "Donation_Confirmation",
            "donation_confirmation",
            "Donation Confirmation",
        ),
        FieldSpec::text("Health_Condition", "health_condition", "Health Condition"),
        FieldSpec::date("Date", "date", "Date").required().rule(DATE_RULE),
        FieldSpec::text("Hospital_ID", "hospital_id", "Hospital ID")
            .required()
            .references("hospital", "hospital_id"),
    ],
    created: CreatedMessage::Fixed("Donor transaction recorded successfully."),
    dependents: "other records",
    joins: &[
        Join {
            alias: "Donor_Name",
            via: "donor_id",
            table: "donor",
            target: "donor_id",
            display: "name",
        },
        Join {
            alias: "Hospital_Name",
            via: "hospital_id",
            table: "hospital",
            target: "hospital_id",
            display: "name",
        },
    ],
    order: &[OrderBy::desc("date"), OrderBy::asc("donor_trans_id")],
};

pub static RECIPIENT_TRANSACTIONS: ResourceSchema = ResourceSchema {
    path: "recipient-transactions",
    label: "Recipient Transaction",
    noun: "recipient transaction",
    plural: "recipient transactions",
    create_verb: "recording",
    table: "recipient_transaction",
    fields: &[
        FieldSpec::text("Recipient_Trans_ID", "recipient_trans_id", "Transaction ID")
            .primary_key(),
        FieldSpec::text("Recipient_ID", "recipient_id", "Recipient ID")
            .required()
            .references("recipient", "recipient_id"),
        FieldSpec::text("Recipient_Request", "recipient_request", "Recipient Request"),
        FieldSpec::date("Date", "date", "Date").required().rule(DATE_RULE),
        FieldSpec::text("Donor_Card_ID", "donor_card_id", "Donor Card ID")
            .references("donor", "donor_card_id"),
        FieldSpec::text("Blood_Type_ID", "blood_type_id", "Blood Type ID")
            .required()
            .references("blood_type", "blood_type_id"),
        FieldSpec::text("Hospital_ID", "hospital_id", "Hospital ID")
            .required()
            .references("hospital", "hospital_id"),
    ],
    created: CreatedMessage::Fixed("Recipient transaction recorded successfully."),
    dependents: "other records",
    joins: &[
        Join {
            alias: "Recipient_Name",
            via: "recipient_id",
            table: "recipient",
            target: "recipient_id",
            display: "name",
        },
        Join {
            alias: "Hospital_Name",
            via: "hospital_id",
            table: "hospital",
            target: "hospital_id",
            display: "name",
        },
        Join {
            alias: "Blood_Type_Name",
            via: "blood_type_id",
            table: "blood_type",
            target: "blood_type_id",
            display: "name",
        },
        Join {
            alias: "Card_Donor_ID",
            via: "donor_card_id",
            table: "donor",
            target: "donor_card_id",
            display: "donor_id",
        },
    ],
    order: &[OrderBy::desc("date"), OrderBy::asc("recipient_trans_id")],
};

/// Every resource, in dependency order (referenced tables first)
pub static ALL: [&ResourceSchema; 6] = [
    &BLOOD_TYPES,
    &HOSPITALS,
    &DONORS,
    &RECIPIENTS,
    &DONOR_TRANSACTIONS,
    &RECIPIENT_TRANSACTIONS,
];

pub fn by_table(table: &str) -> Option<&'static ResourceSchema> {
    ALL.iter().copied().find(|s| s.table == table)
}

pub fn by_path(path: &str) -> Option<&'static ResourceSchema> {
    ALL.iter().copied().find(|s| s.path == path)
}
