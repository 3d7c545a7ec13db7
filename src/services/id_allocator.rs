// src/services/id_allocator.rs

use uuid::{Uuid, Variant};

/// Fonte de IDs novos. Tudo que sai daqui tem que passar em `is_canonical_id`,
/// senão a próxima carga realocaria o ID de novo.
pub trait IdAllocator: Send + Sync {
    fn allocate(&self) -> String;
}

// UUID v4 com 122 bits aleatórios vindos do sistema operacional.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidAllocator;

impl IdAllocator for UuidAllocator {
    fn allocate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Formato canônico: 36 caracteres com hífens, nibble de versão 4 e
/// variante RFC 4122 (`8`, `9`, `a` ou `b`). Maiúsculas são aceitas.
pub fn is_canonical_id(candidate: &str) -> bool {
    // O parser do `uuid` também aceita a forma sem hífens e com chaves
    if candidate.len() != 36 {
        return false;
    }

    match Uuid::try_parse(candidate) {
        Ok(id) => id.get_version_num() == 4 && id.get_variant() == Variant::RFC4122,
        Err(_) => false,
    }
}
