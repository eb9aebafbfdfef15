//! Claims table migration.
//!
//! Creates the claims table holding every submitted claim form.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(CLAIMS_SQL).await?;
        db.execute_unprepared(UPDATED_AT_TRIGGER_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS claims CASCADE;")
            .await?;
        db.execute_unprepared("DROP FUNCTION IF EXISTS claims_touch_updated_at();")
            .await?;
        Ok(())
    }
}

const CLAIMS_SQL: &str = r"
CREATE TABLE claims (
    id UUID PRIMARY KEY,
    email TEXT NOT NULL CHECK (btrim(email) <> ''),
    phone TEXT NOT NULL CHECK (btrim(phone) <> ''),
    full_name TEXT NOT NULL CHECK (btrim(full_name) <> ''),
    flight_number TEXT NOT NULL CHECK (btrim(flight_number) <> ''),
    booking_reference TEXT NOT NULL CHECK (btrim(booking_reference) <> ''),
    flight_date DATE NOT NULL,
    case_number TEXT NOT NULL CHECK (btrim(case_number) <> ''),
    signature TEXT NOT NULL CHECK (btrim(signature) <> '' AND char_length(signature) <= 1000000),
    attachments JSONB NOT NULL DEFAULT '{}'::jsonb CHECK (jsonb_typeof(attachments) = 'object'),
    status VARCHAR(32) NOT NULL DEFAULT 'unprocessed'
        CHECK (status IN ('unprocessed', 'in_review', 'processed', 'rejected')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Review queues filter by status
CREATE INDEX idx_claims_status ON claims(status);

-- Listing is newest first
CREATE INDEX idx_claims_created_at ON claims(created_at DESC);
";

const UPDATED_AT_TRIGGER_SQL: &str = r"
CREATE OR REPLACE FUNCTION claims_touch_updated_at() RETURNS TRIGGER AS $$
BEGIN
    IF NEW.updated_at = OLD.updated_at THEN
        NEW.updated_at := now();
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_claims_updated_at
    BEFORE UPDATE ON claims
    FOR EACH ROW EXECUTE FUNCTION claims_touch_updated_at();
";
