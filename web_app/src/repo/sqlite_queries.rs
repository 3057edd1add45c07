pub const QUERY_GET_TENANT: &str = r#"
SELECT id,name,whatsapp_phone_number_id,created_at,updated_at
FROM tenant
WHERE id=$1;
"#;

pub const QUERY_GET_TENANT_BY_PHONE_NUMBER_ID: &str = r#"
SELECT id,name,whatsapp_phone_number_id,created_at,updated_at
FROM tenant
WHERE whatsapp_phone_number_id=$1;
"#;

pub const QUERY_GET_CONVERSATION: &str = r#"
SELECT
    c.id,c.tenant_id,c.status,c.last_message_at,c.created_at,c.updated_at,
    ct.name AS contact_name,ct.phone AS contact_phone
FROM conversation AS c
LEFT JOIN contact AS ct ON (ct.id=c.contact_id)
WHERE c.id=$1;
"#;

pub const QUERY_LIST_CONVERSATIONS: &str = r#"
SELECT
    c.id,c.tenant_id,c.status,c.last_message_at,c.created_at,c.updated_at,
    ct.name AS contact_name,ct.phone AS contact_phone
FROM conversation AS c
LEFT JOIN contact AS ct ON (ct.id=c.contact_id)
WHERE
    ($1 IS NULL OR c.tenant_id=$1) AND
    ($2 IS NULL OR c.status=$2) AND
    ($3 IS NULL OR c.updated_at<$3 OR (c.updated_at=$3 AND c.id<$4))
ORDER BY c.updated_at DESC, c.id DESC
LIMIT $5;
"#;

pub const QUERY_GET_CONVERSATION_MESSAGES: &str = r#"
SELECT
    id,conversation_id,direction,sender,recipient,body,sent_at,created_at,external_id
FROM message
WHERE
    conversation_id=$1 AND
    ($2 IS NULL OR sent_at>$2 OR (sent_at=$2 AND id>$3))
ORDER BY sent_at ASC, id ASC
LIMIT $4;
"#;

pub const QUERY_UPDATE_CONVERSATION_STATUS: &str = r#"
UPDATE conversation SET status=$1,updated_at=$2 WHERE id=$3;
"#;

pub const QUERY_UPSERT_CONTACT: &str = r#"
INSERT INTO contact(tenant_id,name,phone,created_at,updated_at)
VALUES($1,$2,$3,$4,$4)
ON CONFLICT(tenant_id,phone) DO UPDATE SET name=excluded.name,updated_at=excluded.updated_at
RETURNING id;
"#;

pub const QUERY_GET_ACTIVE_CONTACT_CONVERSATION: &str = r#"
SELECT id
FROM conversation
WHERE tenant_id=$1 AND contact_id=$2 AND status!='CLOSED'
ORDER BY updated_at DESC, id DESC
LIMIT 1;
"#;

pub const QUERY_INSERT_CONVERSATION: &str = r#"
INSERT INTO conversation(tenant_id,contact_id,status,created_at,updated_at)
VALUES($1,$2,'OPEN',$3,$3);
"#;

pub const QUERY_INSERT_MESSAGE: &str = r#"
INSERT INTO message(
    conversation_id,direction,sender,recipient,body,sent_at,created_at,external_id
) VALUES($1,$2,$3,$4,$5,$6,$7,$8)
RETURNING id,conversation_id,direction,sender,recipient,body,sent_at,created_at,external_id;
"#;

/// No row comes back when `external_id` is already stored
pub const QUERY_INSERT_INBOUND_MESSAGE: &str = r#"
INSERT INTO message(
    conversation_id,direction,sender,recipient,body,sent_at,created_at,external_id
) VALUES($1,$2,$3,$4,$5,$6,$7,$8)
ON CONFLICT(external_id) DO NOTHING
RETURNING id,conversation_id,direction,sender,recipient,body,sent_at,created_at,external_id;
"#;

pub const QUERY_TOUCH_CONVERSATION_ACTIVITY: &str = r#"
UPDATE conversation
SET
    last_message_at=CASE
        WHEN last_message_at IS NULL OR last_message_at<$2 THEN $2
        ELSE last_message_at
    END,
    updated_at=$3
WHERE id=$1;
"#;
