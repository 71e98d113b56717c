//! Initial database migration.
//!
//! Creates the enums, tables, indexes and the `resumo_orcamento` view.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TABLES
        // ============================================================
        db.execute_unprepared(USUARIOS_SQL).await?;
        db.execute_unprepared(CATEGORIAS_SQL).await?;
        db.execute_unprepared(ORCAMENTOS_SQL).await?;
        db.execute_unprepared(LOGS_SQL).await?;
        db.execute_unprepared(TOKEN_BLACKLIST_SQL).await?;

        // ============================================================
        // PART 3: VIEWS
        // ============================================================
        db.execute_unprepared(RESUMO_ORCAMENTO_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE user_role AS ENUM ('admin', 'gestor', 'visualizador');
CREATE TYPE budget_status AS ENUM ('rascunho', 'aguardando_aprovacao', 'aprovado', 'reprovado');
";

const USUARIOS_SQL: &str = r"
CREATE TABLE usuarios (
    id_usuario SERIAL PRIMARY KEY,
    nome VARCHAR(100) NOT NULL,
    email VARCHAR(150) NOT NULL UNIQUE,
    senha_hash VARCHAR(255) NOT NULL,
    papel user_role NOT NULL DEFAULT 'visualizador',
    criado_em TIMESTAMPTZ DEFAULT now()
);
";

const CATEGORIAS_SQL: &str = r"
CREATE TABLE categorias (
    id_categoria SERIAL PRIMARY KEY,
    categoria VARCHAR(100) NOT NULL,
    uf VARCHAR(20),
    master VARCHAR(100),
    grupo VARCHAR(100),
    cod_class VARCHAR(20),
    classe_custo VARCHAR(100),
    criado_em TIMESTAMPTZ DEFAULT now(),
    CONSTRAINT uq_categoria_grupo_cod UNIQUE NULLS NOT DISTINCT (categoria, grupo, cod_class)
);

CREATE INDEX idx_categorias_master ON categorias(master);
CREATE INDEX idx_categorias_uf ON categorias(uf);
";

const ORCAMENTOS_SQL: &str = r"
CREATE TABLE orcamentos (
    id_orcamento SERIAL PRIMARY KEY,
    id_categoria INTEGER NOT NULL REFERENCES categorias(id_categoria) ON DELETE CASCADE,
    mes VARCHAR(20) NOT NULL,
    ano INTEGER NOT NULL,
    orcado NUMERIC(15, 2) NOT NULL DEFAULT 0,
    realizado NUMERIC(15, 2) NOT NULL DEFAULT 0,
    dif NUMERIC(15, 2) NOT NULL DEFAULT 0,
    status budget_status NOT NULL DEFAULT 'rascunho',
    aprovado_por INTEGER REFERENCES usuarios(id_usuario) ON DELETE SET NULL,
    data_aprovacao TIMESTAMPTZ,
    criado_por INTEGER REFERENCES usuarios(id_usuario) ON DELETE SET NULL,
    atualizado_por INTEGER REFERENCES usuarios(id_usuario) ON DELETE SET NULL,
    criado_em TIMESTAMPTZ DEFAULT now(),
    atualizado_em TIMESTAMPTZ DEFAULT now(),
    CONSTRAINT uq_orcamento_categoria_mes_ano UNIQUE (id_categoria, mes, ano),
    CONSTRAINT chk_orcamento_mes CHECK (mes IN (
        'Janeiro', 'Fevereiro', 'Março', 'Abril', 'Maio', 'Junho',
        'Julho', 'Agosto', 'Setembro', 'Outubro', 'Novembro', 'Dezembro'
    )),
    CONSTRAINT chk_orcamento_dif CHECK (dif = realizado - orcado)
);

CREATE INDEX idx_orcamentos_ano ON orcamentos(ano);
CREATE INDEX idx_orcamentos_status ON orcamentos(status);
";

const LOGS_SQL: &str = r"
CREATE TABLE logs (
    id_log SERIAL PRIMARY KEY,
    id_usuario INTEGER REFERENCES usuarios(id_usuario) ON DELETE SET NULL,
    acao VARCHAR(255) NOT NULL,
    tabela_afetada VARCHAR(50),
    id_registro INTEGER,
    timestamp TIMESTAMPTZ NOT NULL DEFAULT now(),
    detalhes JSONB
);

CREATE INDEX idx_logs_timestamp ON logs(timestamp DESC);
CREATE INDEX idx_logs_usuario ON logs(id_usuario);
CREATE INDEX idx_logs_tabela ON logs(tabela_afetada);
";

const TOKEN_BLACKLIST_SQL: &str = r"
CREATE TABLE token_blacklist (
    id SERIAL PRIMARY KEY,
    jti VARCHAR(36) NOT NULL UNIQUE,
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const RESUMO_ORCAMENTO_SQL: &str = r"
CREATE VIEW resumo_orcamento AS
SELECT
    c.id_categoria,
    c.categoria,
    c.uf,
    c.master,
    c.grupo,
    c.cod_class,
    c.classe_custo,
    o.ano,
    o.mes,
    SUM(o.orcado) AS total_orcado,
    SUM(o.realizado) AS total_realizado,
    SUM(o.dif) AS total_dif
FROM orcamentos o
JOIN categorias c ON c.id_categoria = o.id_categoria
GROUP BY c.id_categoria, c.categoria, c.uf, c.master, c.grupo, c.cod_class, c.classe_custo, o.ano, o.mes;
";

const DROP_ALL_SQL: &str = r"
DROP VIEW IF EXISTS resumo_orcamento CASCADE;

DROP TABLE IF EXISTS token_blacklist CASCADE;
DROP TABLE IF EXISTS logs CASCADE;
DROP TABLE IF EXISTS orcamentos CASCADE;
DROP TABLE IF EXISTS categorias CASCADE;
DROP TABLE IF EXISTS usuarios CASCADE;

DROP TYPE IF EXISTS budget_status CASCADE;
DROP TYPE IF EXISTS user_role CASCADE;
";
